//! The label sync job: fetch labeled issues, store their label sets.
//!
//! Every row is written with insert-or-replace, so running the job again is
//! always safe. Rows upserted before a failure are still committed.

use tracing::{error, info, warn};

use crate::{
    Config, IssueTracker, Label, ProposalState, ProposalStateStore, ProposalStateWriter,
    Repository, SyncError,
};

/// Outcome of a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub repository: String,
    /// Names of the labels the issue query was filtered on.
    pub labels: Vec<String>,
    pub upserted: usize,
}

/// Opens the store at `config.db_path`, runs the job and closes the store.
pub fn sync<T: IssueTracker + ?Sized>(
    config: &Config,
    tracker: &T,
) -> Result<SyncReport, SyncError> {
    let mut store = ProposalStateStore::open(&config.db_path)?;
    // On error the store is dropped here, which releases the connection too.
    let report = run(config, tracker, &mut store)?;
    store.close()?;
    Ok(report)
}

pub fn run<T: IssueTracker + ?Sized>(
    config: &Config,
    tracker: &T,
    store: &mut ProposalStateStore,
) -> Result<SyncReport, SyncError> {
    let repo = tracker.repository(&config.repo)?;
    info!("Connected to {}", repo.full_name);

    info!("Downloading labels for {}", repo.full_name);
    let filter = resolve_filter(config, tracker.list_labels(&repo)?);
    let names: Vec<String> = filter.iter().map(|l| l.name.clone()).collect();
    info!("Downloading issues and PRs with labels: {:?}", names);

    let writer = store.writer()?;
    let mut upserted = 0;
    let outcome = upsert_issues(tracker, &repo, &filter, config, &writer, &mut upserted);

    match (outcome, writer.commit()) {
        (Ok(()), Ok(())) => {
            info!("Stored labels for {} issues", upserted);
            Ok(SyncReport {
                repository: repo.full_name,
                labels: names,
                upserted,
            })
        }
        (Ok(()), Err(e)) => Err(e),
        (Err(e), Ok(())) => {
            warn!("Run failed after committing {} rows", upserted);
            Err(e)
        }
        (Err(e), Err(commit_err)) => {
            error!("Failed to commit after error: {}", commit_err);
            Err(e)
        }
    }
}

/// Keeps the repository labels named in the configured filter, in repository
/// order. An empty filter resolves to an empty list, which the issue query
/// treats as no constraint.
fn resolve_filter(config: &Config, repo_labels: Vec<Label>) -> Vec<Label> {
    repo_labels
        .into_iter()
        .filter(|l| config.labels.contains(&l.name))
        .collect()
}

fn upsert_issues<T: IssueTracker + ?Sized>(
    tracker: &T,
    repo: &Repository,
    filter: &[Label],
    config: &Config,
    writer: &ProposalStateWriter<'_>,
    upserted: &mut usize,
) -> Result<(), SyncError> {
    for issue in tracker.list_issues(repo, filter, config.state)? {
        let state = ProposalState::from_issue(&issue?);
        info!("Inserting {}:{}", state.number, state.labels);
        writer.upsert(&state)?;
        *upserted += 1;
    }
    Ok(())
}
