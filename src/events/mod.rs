mod sqlite_event_store;

pub use sqlite_event_store::{SqliteEventStore, EVENT_TABLE_V_0};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A promotional event announced by an influencer. Date and time are kept
/// as opaque client-supplied strings.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Event {
    pub id: i64,
    pub owner_email: String,
    pub name: String,
    pub date: String,
    pub time: String,
    pub city: String,
    pub venue: String,
}

#[derive(Clone, Deserialize, Debug)]
pub struct NewEvent {
    pub name: String,
    pub date: String,
    pub time: String,
    pub city: String,
    pub venue: String,
}

pub trait EventStore: Send + Sync {
    /// Persists a new event for the owner. Returns the assigned id.
    fn create(&self, owner_email: &str, event: &NewEvent) -> Result<i64>;

    /// Events belonging to the owner, in insertion order.
    fn list_for_owner(&self, owner_email: &str) -> Result<Vec<Event>>;

    /// Deletes the event only when both id and owner match. Returns
    /// Ok(false) when no row matched, without telling which check failed.
    fn delete(&self, id: i64, owner_email: &str) -> Result<bool>;

    /// Removes every event the owner has, for account deletion.
    fn delete_for_owner(&self, owner_email: &str) -> Result<usize>;
}
