//! Test fixture creation
//!
//! Seeds a fresh database directory with one account per role so tests
//! can log in without going through signup first.

use super::constants::*;
use anyhow::Result;
use promo_server::{Role, SqliteUserStore, UserManager};
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary db directory with seeded accounts.
/// Returns (temp_dir, user_db_path, marketplace_db_path, media_path).
pub fn create_test_db_dir() -> Result<(TempDir, PathBuf, PathBuf, PathBuf)> {
    let dir = TempDir::new()?;
    let user_db_path = dir.path().join("user.db");
    let marketplace_db_path = dir.path().join("marketplace.db");
    let media_path = dir.path().join("media");

    let manager = UserManager::new(Box::new(SqliteUserStore::new(&user_db_path)?));
    manager.register(ADMIN_USER, ADMIN_PASS, Role::Admin)?;
    manager.register(INFLUENCER_USER, INFLUENCER_PASS, Role::Influencer)?;
    manager.register(COLLABORATOR_USER, COLLABORATOR_PASS, Role::Collaborator)?;

    Ok((dir, user_db_path, marketplace_db_path, media_path))
}
