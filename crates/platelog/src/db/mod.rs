//! Intake record persistence on SQLite.
//!
//! One connection per process, shared by the request path and the enrichment
//! workers. Workers reach it through `spawn_blocking`, never from async code.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

pub mod error;
pub mod intake_repo;
pub mod migrations;

pub use error::DatabaseError;

/// How long a write waits on another process holding the file lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the intake database.
///
/// `intake_repo::transition_from_pending` reads the previous `updated_at`
/// and writes the terminal row inside one `with_conn` call; holding the
/// mutex for the whole closure is what keeps `updated_at` strictly
/// increasing between concurrent workers.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens or creates the database file, creating its directory, and
    /// brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let db = Self::prepare(conn)?;

        log::info!("Intake database ready at {}", path.display());
        Ok(db)
    }

    /// Private in-memory database with the full schema.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, DatabaseError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// Returns the canonical database path: `~/.platelog/data/platelog.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".platelog").join("data").join("platelog.db"))
}
