use crate::{config::RepoId, Issue, Label, Repository, StateFilter, SyncError};

/// Lazily fetched issues. Each item may fail independently, e.g. when a later
/// page cannot be retrieved.
pub type Issues<'a> = Box<dyn Iterator<Item = Result<Issue, SyncError>> + 'a>;

/// The read-only parts of an issue tracker the sync job needs.
pub trait IssueTracker {
    fn repository(&self, id: &RepoId) -> Result<Repository, SyncError>;

    fn list_labels(&self, repo: &Repository) -> Result<Vec<Label>, SyncError>;

    /// Issues carrying every label in `labels`. An empty slice means no label
    /// constraint at all.
    fn list_issues(
        &self,
        repo: &Repository,
        labels: &[Label],
        state: StateFilter,
    ) -> Result<Issues<'_>, SyncError>;
}
