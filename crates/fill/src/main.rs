use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use labeldb::{config::DEFAULT_DB_PATH, Config, StateFilter, Token};

mod github;

/// Record the labels of a repository's issues and pull requests in SQLite.
#[derive(Debug, Parser)]
struct Args {
    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Repository to read, as owner/name
    #[arg(long, env = "LABELDB_REPO")]
    repo: String,

    /// Only record issues carrying these labels. Repeat or separate with
    /// commas; leave out to record every issue.
    #[arg(long = "label", env = "LABELDB_LABELS", value_delimiter = ',')]
    labels: Vec<String>,

    /// Issue state to fetch: open, closed or all
    #[arg(long, default_value_t = StateFilter::Open)]
    state: StateFilter,

    /// SQLite database file
    #[arg(long, env = "LABELDB_DB", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = github::DEFAULT_API_URL)]
    api_url: String,
}

impl Args {
    fn config(self) -> Result<(Config, String), labeldb::SyncError> {
        let config = Config::new(Token::new(self.token), &self.repo, self.labels)?
            .with_state(self.state)
            .with_db_path(self.db);
        Ok((config, self.api_url))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (config, api_url) = Args::parse().config()?;
    let github = github::GitHub::new(&config.token, &api_url)?;
    match labeldb::sync(&config, &github) {
        Ok(report) => {
            info!(
                "Recorded {} issues from {} into {}",
                report.upserted,
                report.repository,
                config.db_path.display()
            );
            Ok(())
        }
        Err(e) => {
            error!("Sync of {} failed: {}", config.repo, e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_accept_commas_and_repeats() {
        let args = Args::try_parse_from([
            "labeldb-fill",
            "--token",
            "t",
            "--repo",
            "matrix-org/matrix-doc",
            "--label",
            "proposal,kind:core",
            "--label",
            "proposal-in-review",
            "--db",
            "/tmp/x.db",
        ])
        .unwrap();
        let (config, _) = args.config().unwrap();
        assert_eq!(config.labels.len(), 3);
        assert!(config.labels.contains("kind:core"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn state_flag() {
        let args = Args::try_parse_from([
            "labeldb-fill",
            "--token",
            "t",
            "--repo",
            "o/r",
            "--state",
            "closed",
        ])
        .unwrap();
        assert_eq!(args.state, StateFilter::Closed);
    }

    #[test]
    fn malformed_repo_is_rejected() {
        let args =
            Args::try_parse_from(["labeldb-fill", "--token", "t", "--repo", "no-slash"]).unwrap();
        assert!(matches!(args.config(), Err(labeldb::SyncError::Config(_))));
    }

    #[test]
    fn every_flag_is_documented() {
        use clap::CommandFactory;

        let command = Args::command();
        for arg in command.get_arguments() {
            if arg.get_id() == "help" {
                continue;
            }
            assert!(arg.get_help().is_some(), "--{} has no help text", arg.get_id());
        }
        let help = Args::command().render_long_help().to_string();
        assert!(help.contains("GitHub API base URL"));
    }
}
