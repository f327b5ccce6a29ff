//! Local working set of label edits.
//!
//! The buffer is the client-side copy of a repository's labels. Each entry
//! remembers the field values it was loaded with; the pending action is
//! derived from the current draft on every read, never stored, so it can
//! not drift out of sync with the fields.

use std::fmt;

use thiserror::Error;

use crate::api::Label;

/// What a commit will do with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    None,
    Create,
    Update,
    Delete,
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// An editable label field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Color,
    Description,
}

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("no entry at index {0}")]
    NoSuchEntry(usize),

    #[error("entry `{0}` is marked for deletion; recover it before editing")]
    EntryFrozen(String),

    #[error("entry `{0}` is not marked for deletion")]
    NotDeleted(String),
}

/// One label row: the current draft plus the snapshot it is diffed against.
#[derive(Debug, Clone)]
pub struct BufferEntry {
    draft: Label,
    original: Label,
    is_new: bool,
    deleted: bool,
}

impl BufferEntry {
    fn existing(label: Label) -> Self {
        Self {
            draft: label.clone(),
            original: label,
            is_new: false,
            deleted: false,
        }
    }

    fn added(label: Label) -> Self {
        Self {
            draft: label,
            original: Label::default(),
            is_new: true,
            deleted: false,
        }
    }

    /// Current field values.
    #[must_use]
    pub fn draft(&self) -> &Label {
        &self.draft
    }

    /// The name this entry is addressed by on the server (its name at the
    /// last load). Empty for entries that never existed remotely.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original.name
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Derive what a commit would do with this entry.
    ///
    /// Locally added entries commit as creates until removed; entries
    /// loaded from the server compare the draft against the load snapshot.
    #[must_use]
    pub fn pending_action(&self) -> PendingAction {
        if self.deleted {
            PendingAction::Delete
        } else if self.is_new {
            PendingAction::Create
        } else if self.draft == self.original {
            PendingAction::None
        } else {
            PendingAction::Update
        }
    }
}

/// Ordered collection of label entries being edited.
///
/// Membership and ordering never sync back to the server; every load
/// rebuilds the buffer from scratch.
#[derive(Debug, Default)]
pub struct EditBuffer {
    entries: Vec<BufferEntry>,
}

impl EditBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole buffer with freshly fetched labels.
    pub fn load(&mut self, labels: Vec<Label>) {
        self.entries = labels.into_iter().map(BufferEntry::existing).collect();
    }

    /// Append an empty entry to be filled in, pending as a create.
    pub fn add_blank(&mut self) -> usize {
        self.add_new(Label::default())
    }

    /// Append a locally new entry seeded with values. Copying from another
    /// repository lands here.
    pub fn add_new(&mut self, label: Label) -> usize {
        self.entries.push(BufferEntry::added(label));
        self.entries.len() - 1
    }

    /// Change one field of an entry.
    ///
    /// # Errors
    ///
    /// Rejected with [`BufferError::EntryFrozen`] while the entry is marked
    /// for deletion.
    pub fn edit_field(
        &mut self,
        index: usize,
        field: Field,
        value: impl Into<String>,
    ) -> Result<(), BufferError> {
        let entry = self.entry_mut(index)?;
        if entry.deleted {
            return Err(BufferError::EntryFrozen(entry.draft.name.clone()));
        }
        let value = value.into();
        match field {
            Field::Name => entry.draft.name = value,
            Field::Color => entry.draft.color = value,
            Field::Description => entry.draft.description = value,
        }
        Ok(())
    }

    /// Mark an entry for deletion.
    ///
    /// Entries that never existed remotely are removed outright instead of
    /// being committed as a delete; everything else keeps its place with
    /// its fields frozen until recovered.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NoSuchEntry`] for an out-of-range index.
    pub fn mark_deleted(&mut self, index: usize) -> Result<(), BufferError> {
        let is_new = self
            .entries
            .get(index)
            .ok_or(BufferError::NoSuchEntry(index))?
            .is_new;
        if is_new {
            self.entries.remove(index);
        } else {
            self.entries[index].deleted = true;
        }
        Ok(())
    }

    /// Reverse a not-yet-committed deletion. The pending action falls out
    /// of the usual draft-vs-original comparison again.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotDeleted`] if the entry is not marked.
    pub fn recover(&mut self, index: usize) -> Result<(), BufferError> {
        let entry = self.entry_mut(index)?;
        if !entry.deleted {
            return Err(BufferError::NotDeleted(entry.draft.name.clone()));
        }
        entry.deleted = false;
        Ok(())
    }

    /// True when any entry would commit something. Drives whether a commit
    /// is offered at all.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.pending_action() != PendingAction::None)
    }

    /// Index of the entry whose draft name matches, if any.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.draft.name == name)
    }

    #[must_use]
    pub fn entries(&self) -> &[BufferEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut BufferEntry, BufferError> {
        self.entries
            .get_mut(index)
            .ok_or(BufferError::NoSuchEntry(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str, color: &str, description: &str) -> Label {
        Label {
            name: name.to_string(),
            color: color.to_string(),
            description: description.to_string(),
        }
    }

    fn loaded() -> EditBuffer {
        let mut buffer = EditBuffer::new();
        buffer.load(vec![
            label("bug", "EE0701", "Something is broken"),
            label("docs", "0052CC", ""),
        ]);
        buffer
    }

    #[test]
    fn loaded_entries_start_clean() {
        let buffer = loaded();
        assert_eq!(buffer.len(), 2);
        assert!(!buffer.has_pending_changes());
        for entry in buffer.entries() {
            assert_eq!(entry.pending_action(), PendingAction::None);
        }
    }

    #[test]
    fn action_is_none_iff_draft_matches_original() {
        let mut buffer = loaded();

        buffer.edit_field(0, Field::Color, "FF0000").unwrap();
        assert_eq!(buffer.entries()[0].pending_action(), PendingAction::Update);

        buffer.edit_field(0, Field::Description, "changed").unwrap();
        assert_eq!(buffer.entries()[0].pending_action(), PendingAction::Update);

        // Editing every field back to its loaded value clears the action.
        buffer.edit_field(0, Field::Color, "EE0701").unwrap();
        buffer
            .edit_field(0, Field::Description, "Something is broken")
            .unwrap();
        assert_eq!(buffer.entries()[0].pending_action(), PendingAction::None);
        assert!(!buffer.has_pending_changes());
    }

    #[test]
    fn rename_keeps_the_original_name_for_addressing() {
        let mut buffer = loaded();
        buffer.edit_field(1, Field::Name, "documentation").unwrap();

        let entry = &buffer.entries()[1];
        assert_eq!(entry.pending_action(), PendingAction::Update);
        assert_eq!(entry.original_name(), "docs");
        assert_eq!(entry.draft().name, "documentation");
    }

    #[test]
    fn new_entries_pend_as_create_and_delete_removes_them() {
        let mut buffer = loaded();
        let index = buffer.add_blank();
        assert_eq!(buffer.entries()[index].pending_action(), PendingAction::Create);
        assert!(buffer.has_pending_changes());

        buffer.edit_field(index, Field::Name, "triage").unwrap();
        assert_eq!(buffer.entries()[index].pending_action(), PendingAction::Create);

        buffer.mark_deleted(index).unwrap();
        assert_eq!(buffer.len(), 2, "new entries vanish instead of pending as delete");
        assert!(!buffer.has_pending_changes());
    }

    #[test]
    fn deleting_freezes_fields_until_recovered() {
        let mut buffer = loaded();
        buffer.mark_deleted(0).unwrap();
        assert_eq!(buffer.entries()[0].pending_action(), PendingAction::Delete);

        let err = buffer.edit_field(0, Field::Name, "renamed").unwrap_err();
        assert!(matches!(err, BufferError::EntryFrozen(_)));

        buffer.recover(0).unwrap();
        assert_eq!(buffer.entries()[0].pending_action(), PendingAction::None);
        buffer.edit_field(0, Field::Name, "renamed").unwrap();
        assert_eq!(buffer.entries()[0].pending_action(), PendingAction::Update);
    }

    #[test]
    fn recover_after_an_edit_yields_update_not_none() {
        let mut buffer = loaded();
        buffer.edit_field(0, Field::Color, "FF0000").unwrap();
        buffer.mark_deleted(0).unwrap();
        buffer.recover(0).unwrap();
        assert_eq!(buffer.entries()[0].pending_action(), PendingAction::Update);
    }

    #[test]
    fn recover_rejects_entries_not_marked() {
        let mut buffer = loaded();
        let err = buffer.recover(0).unwrap_err();
        assert!(matches!(err, BufferError::NotDeleted(_)));
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let mut buffer = loaded();
        assert!(matches!(
            buffer.edit_field(9, Field::Name, "x").unwrap_err(),
            BufferError::NoSuchEntry(9)
        ));
        assert!(matches!(
            buffer.mark_deleted(9).unwrap_err(),
            BufferError::NoSuchEntry(9)
        ));
    }

    #[test]
    fn load_rebuilds_from_scratch() {
        let mut buffer = loaded();
        buffer.edit_field(0, Field::Name, "renamed").unwrap();
        buffer.add_blank();

        buffer.load(vec![label("fresh", "00FF00", "")]);
        assert_eq!(buffer.len(), 1);
        assert!(!buffer.has_pending_changes());
        assert_eq!(buffer.find_by_name("fresh"), Some(0));
        assert_eq!(buffer.find_by_name("renamed"), None);
    }
}
