//! Relational reminder store (SQLite).
//!
//! Same contract as the flat-file backend: `save` rewrites the full set in
//! one transaction, `load` groups rows back into the per-session map ordered
//! by anchor time.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::reminder::types::{HolidayGate, ReminderRecord, ReminderStore, RepeatKind};
use crate::store::{prune_expired, ReminderBackend};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reminders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    text TEXT NOT NULL,
    date_time TEXT NOT NULL,
    user_name TEXT,
    repeat_type TEXT,
    holiday_type TEXT,
    creator_id TEXT,
    creator_name TEXT,
    is_task INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_session_id ON reminders(session_id);
CREATE INDEX IF NOT EXISTS idx_creator_id ON reminders(creator_id);
";

pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("opening reminder database at {}", path.display()))?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %path.display(), "opened sqlite reminder store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn load_all(conn: &Connection) -> Result<ReminderStore> {
        let mut stmt = conn.prepare(
            "SELECT session_id, text, date_time, user_name, repeat_type, holiday_type,
                    creator_id, creator_name, is_task
             FROM reminders ORDER BY date_time",
        )?;
        let rows = stmt.query_map([], |row| {
            let session_id: String = row.get(0)?;
            let repeat_type: Option<String> = row.get(4)?;
            let holiday_type: Option<String> = row.get(5)?;
            let record = ReminderRecord {
                text: row.get(1)?,
                date_time: row.get(2)?,
                user_name: row.get(3)?,
                repeat_type: RepeatKind::parse(repeat_type.as_deref().unwrap_or("none")),
                holiday_type: holiday_type.as_deref().and_then(HolidayGate::parse),
                creator_id: row.get(6)?,
                creator_name: row.get(7)?,
                is_task: row.get::<_, i64>(8)? != 0,
            };
            Ok((session_id, record))
        })?;

        let mut store = ReminderStore::new();
        for row in rows {
            let (session_id, record) = row?;
            store.entry(session_id).or_default().push(record);
        }
        Ok(store)
    }

    fn save_all(conn: &mut Connection, store: &ReminderStore) -> Result<()> {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM reminders", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO reminders
                     (session_id, text, date_time, user_name, repeat_type, holiday_type,
                      creator_id, creator_name, is_task)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (session_id, records) in store {
                for r in records {
                    stmt.execute(params![
                        session_id,
                        r.text,
                        r.date_time,
                        r.user_name,
                        r.repeat_type.as_str(),
                        r.holiday_type.map(|g| match g {
                            HolidayGate::Workday => "workday",
                            HolidayGate::Holiday => "holiday",
                        }),
                        r.creator_id,
                        r.creator_name,
                        r.is_task as i64,
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[async_trait]
impl ReminderBackend for SqliteBackend {
    async fn load(&self) -> ReminderStore {
        let conn = self.conn.lock().await;
        match Self::load_all(&conn) {
            Ok(store) => store,
            Err(e) => {
                error!(error = %e, "failed to load reminders from sqlite");
                ReminderStore::new()
            }
        }
    }

    async fn save(&self, store: &ReminderStore) -> bool {
        let mut pruned = store.clone();
        prune_expired(&mut pruned);

        let mut conn = self.conn.lock().await;
        match Self::save_all(&mut conn, &pruned) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to save reminders to sqlite");
                false
            }
        }
    }
}
