//! SQLite connection with the sqlite-vec extension registered.

use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use tokio_rusqlite::Connection;
use tracing::{debug, info};

use indexsync_protocols::StoreError;

/// Default busy timeout for file-backed databases.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

const META_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS _collections (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    fields TEXT NOT NULL DEFAULT '[]',
    indexes TEXT NOT NULL DEFAULT '[]',
    created TEXT NOT NULL,
    updated TEXT NOT NULL
);
"#;

/// Register sqlite-vec for every connection opened after this call.
fn register_sqlite_vec() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // SAFETY: `sqlite3_vec_init` is the statically linked sqlite-vec entry
        // point; sqlite3_auto_extension expects exactly this signature.
        unsafe {
            rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
                sqlite_vec::sqlite3_vec_init as *const (),
            )));
        }
    });
}

/// Shared handle to the backing database.
///
/// Cloning is cheap; all clones talk to the same connection thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>, busy_timeout_ms: u64) -> Result<Self, StoreError> {
        register_sqlite_vec();
        let path = path.as_ref().to_path_buf();
        info!("Opening database at {}", path.display());

        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        conn.call(move |conn| {
            conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            debug!("journal_mode = {}", mode);
            conn.execute_batch(META_SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Schema(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Create a new in-memory database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        register_sqlite_vec();
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        conn.call(|conn| Ok(conn.execute_batch(META_SCHEMA)?))
            .await
            .map_err(|e| StoreError::Schema(e.to_string()))?;

        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run a closure on the connection thread, mapping failures to
    /// [`StoreError::Query`].
    pub async fn call<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.conn
            .call(f)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Whether a table (or virtual table) with this name exists.
    pub async fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.to_string();
        self.call(move |conn| Ok(crate::sql::table_exists(conn, &name)?))
            .await
    }

    /// Version string reported by sqlite-vec.
    pub async fn vec_version(&self) -> Result<String, StoreError> {
        self.call(|conn| Ok(conn.query_row("SELECT vec_version()", [], |row| row.get(0))?))
            .await
    }
}

#[cfg(test)]
#[path = "database_tests.rs"]
mod tests;
