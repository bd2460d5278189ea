pub mod config;
pub mod error;
pub mod job;
pub mod remote;
pub mod store;

pub use config::{Config, RepoId, StateFilter, Token};
pub use error::SyncError;
pub use job::{run, sync, SyncReport};
pub use remote::{IssueTracker, Issues};
pub use store::{ProposalStateStore, ProposalStateWriter};

/// Separator between label names in a stored [`ProposalState`].
pub const LABEL_SEPARATOR: &str = ",";

#[derive(
    Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
pub struct Label {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(
    Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// An issue or pull request. The API returns both from the issues endpoint.
#[derive(
    Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    pub state: IssueState,
    pub title: String,
    pub body: Option<String>,
    pub labels: Vec<Label>,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Repository {
    pub full_name: String,
}

/// Row of the `proposal_state` table.
#[derive(
    Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Deserialize, serde::Serialize,
)]
pub struct ProposalState {
    pub number: u64,
    /// Label names joined by [`LABEL_SEPARATOR`], in the order the API returned them.
    pub labels: String,
}

impl ProposalState {
    pub fn from_issue(issue: &Issue) -> Self {
        Self {
            number: issue.number,
            labels: issue
                .labels
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(LABEL_SEPARATOR),
        }
    }

    /// Splits the stored string back into label names.
    ///
    /// A name that itself contains the separator comes back as two names.
    pub fn label_names(&self) -> Vec<&str> {
        if self.labels.is_empty() {
            return Vec::new();
        }
        self.labels.split(LABEL_SEPARATOR).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn label(name: &str) -> Label {
        Label {
            id: 0,
            name: name.to_string(),
            description: None,
        }
    }

    pub(crate) fn issue(number: u64, labels: &[&str]) -> Issue {
        Issue {
            id: number * 1000,
            number,
            state: IssueState::Open,
            title: format!("Issue #{number}"),
            body: None,
            labels: labels.iter().map(|n| label(n)).collect(),
        }
    }

    #[test]
    fn joins_without_trailing_separator() {
        let state = ProposalState::from_issue(&issue(7, &["a", "b", "c"]));
        assert_eq!(state.number, 7);
        assert_eq!(state.labels, "a,b,c");
    }

    #[test]
    fn no_labels_is_empty_string() {
        let state = ProposalState::from_issue(&issue(2, &[]));
        assert_eq!(state.labels, "");
        assert!(state.label_names().is_empty());
    }

    #[test]
    fn keeps_api_order() {
        let state = ProposalState::from_issue(&issue(3, &["p1", "bug"]));
        assert_eq!(state.labels, "p1,bug");
        assert_eq!(state.label_names(), vec!["p1", "bug"]);
    }

    #[test]
    fn deserializes_api_issue() {
        let json = r#"{
            "id": 1296269,
            "number": 1347,
            "state": "closed",
            "title": "Found a bug",
            "body": null,
            "labels": [{"id": 208045946, "name": "bug", "description": "Something isn't working", "color": "f29513"}],
            "user": {"login": "octocat"}
        }"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.number, 1347);
        assert_eq!(issue.state, IssueState::Closed);
        assert_eq!(ProposalState::from_issue(&issue).labels, "bug");
    }
}
