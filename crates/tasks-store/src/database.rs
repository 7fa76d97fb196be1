use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;
use crate::schema;

/// Location string that selects a non-persistent database.
pub const IN_MEMORY: &str = ":memory:";

/// Thread-safe `SQLite` connection wrapper.
/// Uses `parking_lot::Mutex` for synchronous access (`Connection` is not `Sync`).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Database {
    /// Open `location`: [`IN_MEMORY`] gives a private in-memory database,
    /// anything else is treated as a file path.
    pub fn connect(location: &str) -> Result<Self, StoreError> {
        if location == IN_MEMORY {
            Self::in_memory()
        } else {
            Self::open(Path::new(location))
        }
    }

    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        init_schema(&conn)?;

        info!(path = %path.display(), "database opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: path.to_owned(),
        })
    }

    /// Open an in-memory database. Contents vanish when the last clone drops.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: PathBuf::from(IN_MEMORY),
        })
    }

    /// Execute a closure with the database connection held.
    pub fn with_conn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(schema::PRAGMAS)
        .map_err(StoreError::Schema)?;
    conn.execute_batch(schema::CREATE_TABLES)
        .map_err(StoreError::Schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(db: &Database) -> Vec<String> {
        db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok::<_, rusqlite::Error>(names)
        })
        .unwrap()
    }

    #[test]
    fn open_in_memory() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.path(), Path::new(IN_MEMORY));
    }

    #[test]
    fn connect_memory_location() {
        let db = Database::connect(":memory:").unwrap();
        assert_eq!(db.path(), Path::new(IN_MEMORY));
        assert_eq!(table_names(&db), ["tasks"]);
    }

    #[test]
    fn tasks_table_columns() {
        let db = Database::in_memory().unwrap();
        let columns: Vec<String> = db
            .with_conn(|conn| {
                let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('tasks')")?;
                let cols = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok::<_, rusqlite::Error>(cols)
            })
            .unwrap();
        assert_eq!(columns, ["id", "created_at", "updated_at", "text", "is_complete"]);
    }

    #[test]
    fn open_file_database_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.db");
        let db = Database::connect(path.to_str().unwrap()).unwrap();
        assert!(path.exists());

        // Schema setup is idempotent
        let db2 = Database::open(&path).unwrap();
        assert_eq!(table_names(&db2), ["tasks"]);
        drop(db);
    }

    #[test]
    fn clones_share_connection() {
        let db = Database::in_memory().unwrap();
        let clone = db.clone();
        db.with_conn(|conn| conn.execute_batch("CREATE TABLE extra (x INTEGER)"))
            .unwrap();
        assert!(table_names(&clone).contains(&"extra".to_string()));
    }
}
