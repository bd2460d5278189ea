use std::{collections::BTreeSet, fmt, path::PathBuf, str::FromStr};

use crate::SyncError;

pub const DEFAULT_DB_PATH: &str = "./specs-bot.db";

/// Access credential for the remote API. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Repository identifier in `owner/name` form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(SyncError::Config(format!(
                "repository must look like owner/name, got {s:?}"
            ))),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Which issue states the remote query asks for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }
}

impl FromStr for StateFilter {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(StateFilter::Open),
            "closed" => Ok(StateFilter::Closed),
            "all" => Ok(StateFilter::All),
            other => Err(SyncError::Config(format!(
                "unknown issue state {other:?}, expected open, closed or all"
            ))),
        }
    }
}

impl fmt::Display for StateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a sync run needs. Built once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub token: Token,
    pub repo: RepoId,
    /// Label names to filter on. Empty means every issue.
    pub labels: BTreeSet<String>,
    pub state: StateFilter,
    pub db_path: PathBuf,
}

impl Config {
    pub fn new<I, S>(token: Token, repo: &str, labels: I) -> Result<Self, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            token,
            repo: repo.parse()?,
            labels: labels
                .into_iter()
                .map(Into::into)
                .map(|l: String| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            state: StateFilter::default(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
        })
    }

    pub fn with_state(mut self, state: StateFilter) -> Self {
        self.state = state;
        self
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}
