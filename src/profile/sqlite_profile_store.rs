use super::{CollaboratorProfile, InfluencerFilter, InfluencerProfile, ProfileStore};
use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, DEFAULT_TIMESTAMP};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// V 0
pub const INFLUENCER_PROFILE_TABLE_V_0: Table = Table {
    name: "influencer_profile",
    columns: &[
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("display_name", &SqlType::Text, non_null = true),
        sqlite_column!("gender", &SqlType::Text, non_null = true),
        sqlite_column!("birth_date", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text, non_null = true),
        sqlite_column!("city", &SqlType::Text, non_null = true),
        sqlite_column!("contact_number", &SqlType::Text, non_null = true),
        sqlite_column!("field", &SqlType::Text, non_null = true),
        sqlite_column!("instagram", &SqlType::Text, non_null = true),
        sqlite_column!("youtube", &SqlType::Text, non_null = true),
        sqlite_column!("other_social", &SqlType::Text, non_null = true),
        sqlite_column!("media_ref", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_influencer_profile_email", "email"),
        ("idx_influencer_profile_city", "city"),
    ],
};
pub const COLLABORATOR_PROFILE_TABLE_V_0: Table = Table {
    name: "collaborator_profile",
    columns: &[
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("display_name", &SqlType::Text, non_null = true),
        sqlite_column!("gender", &SqlType::Text, non_null = true),
        sqlite_column!("birth_date", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text, non_null = true),
        sqlite_column!("city", &SqlType::Text, non_null = true),
        sqlite_column!("contact_number", &SqlType::Text, non_null = true),
        sqlite_column!("instagram", &SqlType::Text, non_null = true),
        sqlite_column!("media_ref", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_collaborator_profile_email", "email")],
};

fn date_to_column(date: &Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.to_string())
}

fn date_from_column(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|s| s.parse().ok())
}

#[derive(Clone)]
pub struct SqliteProfileStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProfileStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

fn influencer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InfluencerProfile> {
    Ok(InfluencerProfile {
        email: row.get(0)?,
        display_name: row.get(1)?,
        gender: row.get(2)?,
        birth_date: date_from_column(row.get(3)?),
        address: row.get(4)?,
        city: row.get(5)?,
        contact_number: row.get(6)?,
        field: row.get(7)?,
        instagram: row.get(8)?,
        youtube: row.get(9)?,
        other_social: row.get(10)?,
        media_ref: row.get(11)?,
    })
}

const INFLUENCER_COLUMNS: &str = "email, display_name, gender, birth_date, address, city, \
     contact_number, field, instagram, youtube, other_social, media_ref";

impl ProfileStore for SqliteProfileStore {
    fn upsert_influencer(&self, profile: &InfluencerProfile) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
                 ON CONFLICT(email) DO UPDATE SET \
                 display_name = ?2, gender = ?3, birth_date = ?4, address = ?5, city = ?6, \
                 contact_number = ?7, field = ?8, instagram = ?9, youtube = ?10, \
                 other_social = ?11, media_ref = ?12",
                INFLUENCER_PROFILE_TABLE_V_0.name, INFLUENCER_COLUMNS
            ),
            params![
                profile.email,
                profile.display_name,
                profile.gender,
                date_to_column(&profile.birth_date),
                profile.address,
                profile.city,
                profile.contact_number,
                profile.field,
                profile.instagram,
                profile.youtube,
                profile.other_social,
                profile.media_ref,
            ],
        )?;
        Ok(())
    }

    fn upsert_collaborator(&self, profile: &CollaboratorProfile) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (email, display_name, gender, birth_date, address, city, \
                 contact_number, instagram, media_ref) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                 ON CONFLICT(email) DO UPDATE SET \
                 display_name = ?2, gender = ?3, birth_date = ?4, address = ?5, city = ?6, \
                 contact_number = ?7, instagram = ?8, media_ref = ?9",
                COLLABORATOR_PROFILE_TABLE_V_0.name
            ),
            params![
                profile.email,
                profile.display_name,
                profile.gender,
                date_to_column(&profile.birth_date),
                profile.address,
                profile.city,
                profile.contact_number,
                profile.instagram,
                profile.media_ref,
            ],
        )?;
        Ok(())
    }

    fn get_influencer(&self, email: &str) -> Result<Option<InfluencerProfile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE email = ?1",
            INFLUENCER_COLUMNS, INFLUENCER_PROFILE_TABLE_V_0.name
        ))?;
        let profile = stmt
            .query_row(params![email], influencer_from_row)
            .optional()?;
        Ok(profile)
    }

    fn get_collaborator(&self, email: &str) -> Result<Option<CollaboratorProfile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT email, display_name, gender, birth_date, address, city, contact_number, \
             instagram, media_ref FROM {} WHERE email = ?1",
            COLLABORATOR_PROFILE_TABLE_V_0.name
        ))?;
        let profile = stmt
            .query_row(params![email], |row| {
                Ok(CollaboratorProfile {
                    email: row.get(0)?,
                    display_name: row.get(1)?,
                    gender: row.get(2)?,
                    birth_date: date_from_column(row.get(3)?),
                    address: row.get(4)?,
                    city: row.get(5)?,
                    contact_number: row.get(6)?,
                    instagram: row.get(7)?,
                    media_ref: row.get(8)?,
                })
            })
            .optional()?;
        Ok(profile)
    }

    fn all_influencers(&self) -> Result<Vec<InfluencerProfile>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY rowid",
            INFLUENCER_COLUMNS, INFLUENCER_PROFILE_TABLE_V_0.name
        ))?;
        let profiles = stmt
            .query_map([], influencer_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    fn search_influencers(&self, filter: &InfluencerFilter) -> Result<Vec<InfluencerProfile>> {
        let mut sql = format!(
            "SELECT {} FROM {} WHERE 1=1",
            INFLUENCER_COLUMNS, INFLUENCER_PROFILE_TABLE_V_0.name
        );
        // instr(column, '') is 0 in SQLite, an empty criterion must not constrain
        let mut bound: Vec<&str> = vec![];
        if let Some(field) = filter.field.as_deref().filter(|s| !s.is_empty()) {
            bound.push(field);
            sql.push_str(&format!(" AND instr(field, ?{}) > 0", bound.len()));
        }
        if let Some(city) = filter.city.as_deref().filter(|s| !s.is_empty()) {
            bound.push(city);
            sql.push_str(&format!(" AND city = ?{}", bound.len()));
        }
        if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
            bound.push(name);
            sql.push_str(&format!(" AND instr(display_name, ?{}) > 0", bound.len()));
        }
        sql.push_str(" ORDER BY rowid");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let profiles = stmt
            .query_map(params_from_iter(bound.iter()), influencer_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    fn distinct_cities_for_field(&self, field: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        if field.is_empty() {
            let mut stmt = conn.prepare(&format!(
                "SELECT DISTINCT city FROM {} ORDER BY city",
                INFLUENCER_PROFILE_TABLE_V_0.name
            ))?;
            let cities = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            return Ok(cities);
        }
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT city FROM {} WHERE instr(field, ?1) > 0 ORDER BY city",
            INFLUENCER_PROFILE_TABLE_V_0.name
        ))?;
        let cities = stmt
            .query_map(params![field], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(cities)
    }

    fn delete_for_email(&self, email: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE email = ?1",
                INFLUENCER_PROFILE_TABLE_V_0.name
            ),
            params![email],
        )?;
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE email = ?1",
                COLLABORATOR_PROFILE_TABLE_V_0.name
            ),
            params![email],
        )?;
        Ok(())
    }
}
