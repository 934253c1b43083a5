use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub const AUTH_KEY: &str = "auth";

/// Client-local key-value store backing the session flag.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self { conn: Connection::open(path)? })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS session_kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<(String, i64)>> {
        let row = self
            .conn
            .query_row(
                "SELECT value, updated_at FROM session_kv WHERE key = ?1",
                params![key],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    pub fn set(&mut self, key: &str, value: &str, ts: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO session_kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, ts],
        )?;
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM session_kv WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }

    /// True only for a stored `"true"`; anything else reads as logged out.
    pub fn auth_flag(&self) -> Result<bool> {
        Ok(matches!(self.get(AUTH_KEY)?, Some((v, _)) if v == "true"))
    }

    pub fn auth_since(&self) -> Result<Option<i64>> {
        Ok(match self.get(AUTH_KEY)? {
            Some((v, ts)) if v == "true" => Some(ts),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use tempfile::TempDir;

    #[test]
    fn test_unopenable_path_is_storage_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot hold the database file.
        let res = SessionStore::new(dir.path().to_str().unwrap()).and_then(|mut s| s.init());
        assert!(matches!(res, Err(ClientError::Storage(_))));
    }

    #[test]
    fn test_flag_defaults_false() {
        let mut store = SessionStore::in_memory().unwrap();
        store.init().unwrap();
        assert!(!store.auth_flag().unwrap());
        assert_eq!(store.auth_since().unwrap(), None);
    }

    #[test]
    fn test_set_overwrites_and_remove_clears() {
        let mut store = SessionStore::in_memory().unwrap();
        store.init().unwrap();
        store.set(AUTH_KEY, "true", 10).unwrap();
        store.set(AUTH_KEY, "true", 20).unwrap();
        assert_eq!(store.auth_since().unwrap(), Some(20));
        assert!(store.remove(AUTH_KEY).unwrap());
        assert!(!store.remove(AUTH_KEY).unwrap());
        assert!(!store.auth_flag().unwrap());
    }

    #[test]
    fn test_non_true_value_reads_as_logged_out() {
        let mut store = SessionStore::in_memory().unwrap();
        store.init().unwrap();
        store.set(AUTH_KEY, "false", 1).unwrap();
        assert!(!store.auth_flag().unwrap());
    }

    #[test]
    fn test_flag_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.sqlite");
        let path = path.to_str().unwrap();
        {
            let mut store = SessionStore::new(path).unwrap();
            store.init().unwrap();
            store.set(AUTH_KEY, "true", 5).unwrap();
        }
        let mut store = SessionStore::new(path).unwrap();
        store.init().unwrap();
        assert!(store.auth_flag().unwrap());
    }
}
