//! Wire types for the label endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A repository label.
///
/// The service reports more fields (id, url, default flag); only the ones
/// the editor works with are kept, the rest are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name, unique within a repository (server-enforced).
    pub name: String,
    /// Six hex digits, no leading `#`. Uppercased on ingestion.
    pub color: String,
    /// The service reports missing descriptions as `null`.
    #[serde(default, deserialize_with = "null_to_empty")]
    pub description: String,
}

/// Body for create and update calls.
///
/// The update endpoint is addressed by the original name in the path; a
/// rename is expressed by `name` differing from that path segment.
#[derive(Debug, Clone, Serialize)]
pub struct LabelPayload {
    pub name: String,
    pub color: String,
    pub description: String,
}

impl LabelPayload {
    /// Wire form of a label draft. Descriptions are sent trimmed.
    #[must_use]
    pub fn from_label(label: &Label) -> Self {
        Self {
            name: label.name.clone(),
            color: label.color.clone(),
            description: label.description.trim().to_string(),
        }
    }
}

/// Error body returned by the service.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
}

/// An `owner/repo` pair naming a repository. The owner can also be an
/// organization name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

#[derive(Debug, Error)]
#[error("invalid repository `{input}`: expected owner/repo or owner:repo")]
pub struct ParseRepoIdError {
    input: String,
}

impl FromStr for RepoId {
    type Err = ParseRepoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(['/', ':']) {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains(['/', ':']) =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(ParseRepoIdError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn null_to_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_id_accepts_both_separators() {
        let slash: RepoId = "octo/widgets".parse().expect("slash form");
        let colon: RepoId = "octo:widgets".parse().expect("colon form");
        assert_eq!(slash, colon);
        assert_eq!(slash.to_string(), "octo/widgets");
    }

    #[test]
    fn repo_id_rejects_malformed_input() {
        assert!("octo".parse::<RepoId>().is_err());
        assert!("octo/".parse::<RepoId>().is_err());
        assert!("/widgets".parse::<RepoId>().is_err());
        assert!("octo/widgets/extra".parse::<RepoId>().is_err());
    }

    #[test]
    fn null_description_reads_as_empty() {
        let label: Label =
            serde_json::from_str(r#"{"name":"bug","color":"ee0701","description":null}"#)
                .expect("label with null description");
        assert_eq!(label.description, "");
    }

    #[test]
    fn payload_trims_description() {
        let label = Label {
            name: "bug".to_string(),
            color: "EE0701".to_string(),
            description: "  broken  ".to_string(),
        };
        assert_eq!(LabelPayload::from_label(&label).description, "broken");
    }
}
