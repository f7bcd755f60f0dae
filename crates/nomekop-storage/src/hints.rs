//! Persisted reconnect hint
//!
//! A single "was previously connected" flag decides whether a silent
//! reconnect is attempted on startup.

use parking_lot::Mutex;

use crate::database::Database;
use crate::error::StorageError;
use crate::Result;

pub const PREVIOUSLY_CONNECTED_KEY: &str = "wallet.previously_connected";

pub trait HintStore: Send + Sync {
    fn was_connected(&self) -> Result<bool>;
    fn mark_connected(&self) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Hint store backed by the settings table.
#[derive(Clone)]
pub struct SqliteHintStore {
    db: Database,
}

impl SqliteHintStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl HintStore for SqliteHintStore {
    fn was_connected(&self) -> Result<bool> {
        match self.db.get_setting(PREVIOUSLY_CONNECTED_KEY)? {
            None => Ok(false),
            Some(value) => match value.as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                _ => Err(StorageError::InvalidValue {
                    key: PREVIOUSLY_CONNECTED_KEY.to_string(),
                    value,
                }),
            },
        }
    }

    fn mark_connected(&self) -> Result<()> {
        self.db.set_setting(PREVIOUSLY_CONNECTED_KEY, "1")
    }

    fn clear(&self) -> Result<()> {
        self.db.delete_setting(PREVIOUSLY_CONNECTED_KEY)
    }
}

/// Process-local hint store, used when no database is configured.
#[derive(Default)]
pub struct MemoryHintStore {
    flag: Mutex<bool>,
}

impl MemoryHintStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HintStore for MemoryHintStore {
    fn was_connected(&self) -> Result<bool> {
        Ok(*self.flag.lock())
    }

    fn mark_connected(&self) -> Result<()> {
        *self.flag.lock() = true;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.flag.lock() = false;
        Ok(())
    }
}
