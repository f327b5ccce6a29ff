//! Batch reconciliation of buffer edits against the remote repository.

use futures::future::join_all;
use tracing::info;

use crate::api::{LabelApiError, LabelClient, LabelPayload, RepoId};
use crate::buffer::{EditBuffer, PendingAction};

/// Outcome of one operation within a commit round.
#[derive(Debug)]
pub struct CommitOutcome {
    pub action: PendingAction,
    /// The name the operation was addressed by.
    pub name: String,
    pub result: Result<(), LabelApiError>,
}

/// What a commit round did, operation by operation.
///
/// Partial success is the expected shape here; callers inspect
/// [`CommitReport::failed`] rather than a single `Result`.
#[derive(Debug, Default)]
pub struct CommitReport {
    pub outcomes: Vec<CommitOutcome>,
}

impl CommitReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CommitOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// Send every pending buffer action to the server.
///
/// Deletes go out first and are awaited before any update is issued,
/// updates before any create, so a rename can reuse a name deleted in the
/// same batch. Calls within one category run concurrently, and a failure
/// never aborts its siblings; there is no atomic all-or-nothing guarantee.
/// Callers are expected to [`resync`] afterwards.
pub async fn commit(client: &LabelClient, repo: &RepoId, buffer: &EditBuffer) -> CommitReport {
    let mut deletes = Vec::new();
    let mut updates = Vec::new();
    let mut creates = Vec::new();

    for entry in buffer.entries() {
        match entry.pending_action() {
            PendingAction::None => {}
            PendingAction::Delete => deletes.push(entry.draft().name.clone()),
            PendingAction::Update => updates.push((
                entry.original_name().to_string(),
                LabelPayload::from_label(entry.draft()),
            )),
            PendingAction::Create => creates.push(LabelPayload::from_label(entry.draft())),
        }
    }

    let total = deletes.len() + updates.len() + creates.len();
    if total == 0 {
        return CommitReport::default();
    }

    info!(
        deletes = deletes.len(),
        updates = updates.len(),
        creates = creates.len(),
        "Committing label changes"
    );

    let mut outcomes = Vec::with_capacity(total);

    outcomes.extend(
        join_all(deletes.into_iter().map(|name| async move {
            let result = client.delete_label(repo, &name).await;
            CommitOutcome {
                action: PendingAction::Delete,
                name,
                result,
            }
        }))
        .await,
    );

    outcomes.extend(
        join_all(updates.into_iter().map(|(original_name, payload)| async move {
            let result = client
                .update_label(repo, &original_name, &payload)
                .await
                .map(|_| ());
            CommitOutcome {
                action: PendingAction::Update,
                name: original_name,
                result,
            }
        }))
        .await,
    );

    outcomes.extend(
        join_all(creates.into_iter().map(|payload| async move {
            let name = payload.name.clone();
            let result = client.create_label(repo, &payload).await.map(|_| ());
            CommitOutcome {
                action: PendingAction::Create,
                name,
                result,
            }
        }))
        .await,
    );

    if !client.gate().is_locked() {
        client.log().append("All operations are done.");
    }

    CommitReport { outcomes }
}

/// Re-fetch the repository's labels and rebuild the buffer from them.
///
/// This is the only reconciliation step after a commit: whatever the server
/// now holds, including the results of partial failures, becomes the new
/// baseline and any stale pending action is discarded.
///
/// # Errors
///
/// Returns an error if the list fetch fails; the buffer is left untouched.
pub async fn resync(
    client: &LabelClient,
    repo: &RepoId,
    buffer: &mut EditBuffer,
) -> Result<(), LabelApiError> {
    let labels = client.list_labels(repo).await?;
    buffer.load(labels);
    Ok(())
}
