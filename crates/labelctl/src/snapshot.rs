//! TOML snapshot of a repository's labels.
//!
//! The snapshot file is the CLI's stand-in for the editable form: `pull`
//! writes one, the user edits it, `apply` diffs it against the server.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use labels::{Label, RepoId};

/// On-disk document: a list of `[[label]]` tables.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "label", default)]
    pub labels: Vec<Label>,
}

/// Render the fetched labels as a snapshot document with a stamped header.
pub fn render(repo: &RepoId, labels: &[Label]) -> Result<String> {
    let snapshot = Snapshot {
        labels: labels.to_vec(),
    };
    let body = toml::to_string_pretty(&snapshot).context("Failed to serialize labels")?;
    Ok(format!(
        "# Labels of {repo}, pulled {}\n\n{body}",
        Utc::now().to_rfc3339()
    ))
}

/// Read and parse a snapshot file.
pub fn parse(path: &Path) -> Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("{} is not a valid label snapshot", path.display()))
}

/// Reject snapshots the server would bounce label by label: empty names,
/// malformed colors, duplicate names.
pub fn validate(snapshot: &Snapshot) -> Result<()> {
    let mut seen = HashSet::new();
    for label in &snapshot.labels {
        if label.name.trim().is_empty() {
            bail!("snapshot contains a label with an empty name");
        }
        if label.color.len() != 6 || !label.color.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!(
                "label `{}` has color `{}`; expected 6 hex digits without `#`",
                label.name,
                label.color
            );
        }
        if !seen.insert(label.name.as_str()) {
            bail!("label `{}` appears twice in the snapshot", label.name);
        }
    }
    Ok(())
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

    #[test]
    fn rendered_snapshots_parse_back() {
        let repo: RepoId = "octo/widgets".parse().unwrap();
        let labels = vec![
            label("bug", "EE0701", "Something is broken"),
            label("docs", "0052CC", ""),
        ];

        let document = render(&repo, &labels).unwrap();
        let parsed: Snapshot = toml::from_str(&document).unwrap();

        assert_eq!(parsed.labels, labels);
    }

    #[test]
    fn empty_documents_parse_to_no_labels() {
        let parsed: Snapshot = toml::from_str("").unwrap();
        assert!(parsed.labels.is_empty());
    }

    #[test]
    fn validate_rejects_bad_colors() {
        let snapshot = Snapshot {
            labels: vec![label("bug", "#EE0701", "")],
        };
        let err = validate(&snapshot).unwrap_err();
        assert!(err.to_string().contains("6 hex digits"));
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let snapshot = Snapshot {
            labels: vec![label("bug", "EE0701", ""), label("bug", "0052CC", "")],
        };
        let err = validate(&snapshot).unwrap_err();
        assert!(err.to_string().contains("appears twice"));
    }

    #[test]
    fn validate_rejects_empty_names() {
        let snapshot = Snapshot {
            labels: vec![label("  ", "EE0701", "")],
        };
        assert!(validate(&snapshot).is_err());
    }
}
