use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use crate::user::auth::{AuthToken, AuthTokenValue, CredentialHasher, PasswordCredentials};
use crate::user::user_models::UserAccount;
use crate::user::user_store::{AuthTokenStore, CredentialsStore, UserStore};
use crate::user::Role;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex},
    time::SystemTime,
};

/// V 0
const ACCOUNT_TABLE_V_0: Table = Table {
    name: "account",
    columns: &[
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("role", &SqlType::Text, non_null = true),
        sqlite_column!(
            "enabled",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_account_email", "email")],
};
const PASSWORD_CREDENTIALS_TABLE_V_0: Table = Table {
    name: "password_credentials",
    columns: &[
        sqlite_column!(
            "email",
            &SqlType::Text,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "email",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
};
const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "email",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "email",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[("idx_auth_token_value", "value")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ACCOUNT_TABLE_V_0,
        PASSWORD_CREDENTIALS_TABLE_V_0,
        AUTH_TOKEN_TABLE_V_0,
    ],
    migration: None,
}];

fn system_time_from_column_result(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(value as u64)
}

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_account(&self, email: &str, role: Role) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let existing: Option<String> = conn
            .query_row(
                &format!(
                    "SELECT email FROM {} WHERE email = ?1",
                    ACCOUNT_TABLE_V_0.name
                ),
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Ok(false);
        }
        conn.execute(
            &format!(
                "INSERT INTO {} (email, role) VALUES (?1, ?2)",
                ACCOUNT_TABLE_V_0.name
            ),
            params![email, role.as_str()],
        )
        .with_context(|| format!("Failed to create account {}", email))?;
        Ok(true)
    }

    fn get_account(&self, email: &str) -> Result<Option<UserAccount>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT email, role, enabled, created FROM {} WHERE email = ?1",
            ACCOUNT_TABLE_V_0.name
        ))?;
        let account = stmt
            .query_row(params![email], account_from_row)
            .optional()?;
        Ok(account)
    }

    fn get_all_accounts(&self) -> Result<Vec<UserAccount>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT email, role, enabled, created FROM {} ORDER BY rowid",
            ACCOUNT_TABLE_V_0.name
        ))?;
        let accounts = stmt
            .query_map([], account_from_row)?
            .collect::<Result<Vec<UserAccount>, _>>()?;
        Ok(accounts)
    }

    fn set_account_enabled(&self, email: &str, enabled: bool) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET enabled = ?1 WHERE email = ?2",
                ACCOUNT_TABLE_V_0.name
            ),
            params![enabled as i32, email],
        )?;
        Ok(updated > 0)
    }

    fn delete_account(&self, email: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE email = ?1", ACCOUNT_TABLE_V_0.name),
            params![email],
        )?;
        Ok(deleted > 0)
    }
}

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserAccount> {
    let role_string: String = row.get(1)?;
    let role = Role::from_str(&role_string).ok_or(rusqlite::Error::InvalidQuery)?;
    Ok(UserAccount {
        email: row.get(0)?,
        role,
        enabled: row.get::<usize, i32>(2)? == 1,
        created: system_time_from_column_result(row.get(3)?),
    })
}

impl CredentialsStore for SqliteUserStore {
    fn get_credentials(&self, email: &str) -> Result<Option<PasswordCredentials>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT email, salt, hash, hasher, created FROM {} WHERE email = ?1",
            PASSWORD_CREDENTIALS_TABLE_V_0.name
        ))?;
        let credentials = stmt
            .query_row(params![email], |row| {
                let hasher = CredentialHasher::from_str(&row.get::<usize, String>(3)?)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?;
                Ok(PasswordCredentials {
                    email: row.get(0)?,
                    salt: row.get(1)?,
                    hash: row.get(2)?,
                    hasher,
                    created: system_time_from_column_result(row.get(4)?),
                })
            })
            .optional()?;
        Ok(credentials)
    }

    fn update_credentials(&self, credentials: PasswordCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (email, salt, hash, hasher) VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(email) DO UPDATE SET salt = ?2, hash = ?3, hasher = ?4",
                PASSWORD_CREDENTIALS_TABLE_V_0.name
            ),
            params![
                credentials.email,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string()
            ],
        )?;
        Ok(())
    }
}

impl AuthTokenStore for SqliteUserStore {
    fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT email, value, created, last_used FROM {} WHERE value = ?1",
            AUTH_TOKEN_TABLE_V_0.name
        ))?;
        let token = stmt
            .query_row(params![value.0], |row| {
                Ok(AuthToken {
                    email: row.get(0)?,
                    value: AuthTokenValue(row.get(1)?),
                    created: system_time_from_column_result(row.get(2)?),
                    last_used: row
                        .get::<usize, Option<i64>>(3)?
                        .map(system_time_from_column_result),
                })
            })
            .optional()?;
        Ok(token)
    }

    fn delete_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let token = match self.get_auth_token(value)? {
            Some(token) => token,
            None => return Ok(None),
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("DELETE FROM {} WHERE value = ?1", AUTH_TOKEN_TABLE_V_0.name),
            params![token.value.0],
        )?;
        Ok(Some(token))
    }

    fn update_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE {} SET last_used = cast(strftime('%s','now') as int) WHERE value = ?1",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![token.0],
        )?;
        Ok(())
    }

    fn add_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (email, value) VALUES (?1, ?2)",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![token.email, token.value.0],
        )?;
        Ok(())
    }

    fn delete_auth_tokens_for_email(&self, email: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE email = ?1", AUTH_TOKEN_TABLE_V_0.name),
            params![email],
        )?;
        Ok(deleted)
    }

    fn prune_expired_auth_tokens(&self, max_age_days: u64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE created < cast(strftime('%s','now') as int) - ?1",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![(max_age_days * 24 * 60 * 60) as i64],
        )?;
        Ok(deleted)
    }
}
