use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row, Transaction};
use tracing::debug;

use crate::{ProposalState, SyncError};

const SCHEMA: &str = "
-- Labels last seen on each issue or pull request
CREATE TABLE IF NOT EXISTS proposal_state (
    -- Issue or PR number
    number INTEGER PRIMARY KEY,
    -- Comma-separated label names
    labels TEXT NOT NULL
);
";

const UPSERT_SQL: &str = "INSERT OR REPLACE INTO proposal_state (number, labels) VALUES (?1, ?2)";

/// The local `proposal_state` table.
pub struct ProposalStateStore {
    conn: Connection,
}

impl ProposalStateStore {
    /// Opens (creating if needed) the database at `path` and ensures the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SyncError> {
        let path = path.as_ref();
        debug!("Opening store at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    /// Opens an existing database for reading. Nothing is created or written;
    /// a missing file or missing table surfaces as an error.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, SyncError> {
        let path = path.as_ref();
        debug!("Opening store at {} read-only", path.display());
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, SyncError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SyncError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Starts a batch of upserts that become visible together on commit.
    pub fn writer(&mut self) -> Result<ProposalStateWriter<'_>, SyncError> {
        Ok(ProposalStateWriter {
            tx: self.conn.transaction()?,
        })
    }

    pub fn get(&self, number: u64) -> Result<Option<ProposalState>, SyncError> {
        Ok(self
            .conn
            .query_row(
                "SELECT number, labels FROM proposal_state WHERE number = ?1",
                params![to_sql_number(number)?],
                row_to_state,
            )
            .optional()?)
    }

    pub fn all(&self) -> Result<Vec<ProposalState>, SyncError> {
        let mut stmt = self
            .conn
            .prepare("SELECT number, labels FROM proposal_state ORDER BY number")?;
        let states = stmt
            .query_map([], row_to_state)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(states)
    }

    /// Releases the connection, reporting any error SQLite raises while doing so.
    pub fn close(self) -> Result<(), SyncError> {
        self.conn.close().map_err(|(_, e)| SyncError::Store(e))
    }
}

pub struct ProposalStateWriter<'a> {
    tx: Transaction<'a>,
}

impl ProposalStateWriter<'_> {
    /// Inserts the row, replacing any existing row with the same number.
    pub fn upsert(&self, state: &ProposalState) -> Result<(), SyncError> {
        debug!(number = state.number, labels = %state.labels, "Upserting proposal state");
        self.tx
            .prepare_cached(UPSERT_SQL)?
            .execute(params![to_sql_number(state.number)?, state.labels])?;
        Ok(())
    }

    pub fn commit(self) -> Result<(), SyncError> {
        Ok(self.tx.commit()?)
    }
}

fn to_sql_number(number: u64) -> Result<i64, SyncError> {
    i64::try_from(number)
        .map_err(|e| SyncError::Store(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))
}

fn row_to_state(row: &Row<'_>) -> rusqlite::Result<ProposalState> {
    let number: i64 = row.get(0)?;
    Ok(ProposalState {
        number: u64::try_from(number)
            .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, number))?,
        labels: row.get(1)?,
    })
}
