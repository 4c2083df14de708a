//! The marketplace database holds profiles and events. Both stores share
//! one connection so the schema version is managed in one place.

use crate::events::EVENT_TABLE_V_0;
use crate::profile::{COLLABORATOR_PROFILE_TABLE_V_0, INFLUENCER_PROFILE_TABLE_V_0};
use crate::sqlite_persistence::{open_versioned, VersionedSchema};
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        INFLUENCER_PROFILE_TABLE_V_0,
        COLLABORATOR_PROFILE_TABLE_V_0,
        EVENT_TABLE_V_0,
    ],
    migration: None,
}];

pub fn open<T: AsRef<Path>>(db_path: T) -> Result<Arc<Mutex<Connection>>> {
    let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
    Ok(Arc::new(Mutex::new(conn)))
}
