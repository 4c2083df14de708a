use super::{Event, EventStore, NewEvent};
use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, DEFAULT_TIMESTAMP};
use anyhow::Result;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// V 0
pub const EVENT_TABLE_V_0: Table = Table {
    name: "event",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("owner_email", &SqlType::Text, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("date", &SqlType::Text, non_null = true),
        sqlite_column!("time", &SqlType::Text, non_null = true),
        sqlite_column!("city", &SqlType::Text, non_null = true),
        sqlite_column!("venue", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_event_owner_email", "owner_email")],
};

#[derive(Clone)]
pub struct SqliteEventStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEventStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl EventStore for SqliteEventStore {
    fn create(&self, owner_email: &str, event: &NewEvent) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (owner_email, name, date, time, city, venue) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                EVENT_TABLE_V_0.name
            ),
            params![
                owner_email,
                event.name,
                event.date,
                event.time,
                event.city,
                event.venue
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_for_owner(&self, owner_email: &str) -> Result<Vec<Event>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, owner_email, name, date, time, city, venue FROM {} \
             WHERE owner_email = ?1 ORDER BY rowid",
            EVENT_TABLE_V_0.name
        ))?;
        let events = stmt
            .query_map(params![owner_email], |row| {
                Ok(Event {
                    id: row.get(0)?,
                    owner_email: row.get(1)?,
                    name: row.get(2)?,
                    date: row.get(3)?,
                    time: row.get(4)?,
                    city: row.get(5)?,
                    venue: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn delete(&self, id: i64, owner_email: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE id = ?1 AND owner_email = ?2",
                EVENT_TABLE_V_0.name
            ),
            params![id, owner_email],
        )?;
        Ok(deleted > 0)
    }

    fn delete_for_owner(&self, owner_email: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE owner_email = ?1", EVENT_TABLE_V_0.name),
            params![owner_email],
        )?;
        Ok(deleted)
    }
}
