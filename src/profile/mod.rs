mod sqlite_profile_store;

pub use sqlite_profile_store::{
    SqliteProfileStore, COLLABORATOR_PROFILE_TABLE_V_0, INFLUENCER_PROFILE_TABLE_V_0,
};

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Public face of an influencer. One row per account email, replaced
/// wholesale on every save.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct InfluencerProfile {
    pub email: String,
    pub display_name: String,
    pub gender: String,
    pub birth_date: Option<NaiveDate>,
    pub address: String,
    pub city: String,
    pub contact_number: String,
    pub field: String,
    pub instagram: String,
    pub youtube: String,
    pub other_social: String,
    pub media_ref: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct CollaboratorProfile {
    pub email: String,
    pub display_name: String,
    pub gender: String,
    pub birth_date: Option<NaiveDate>,
    pub address: String,
    pub city: String,
    pub contact_number: String,
    pub instagram: String,
    pub media_ref: String,
}

/// Conjunctive influencer search criteria. Absent criteria do not
/// constrain; `field` and `name` are case-sensitive substring matches,
/// `city` matches exactly.
#[derive(Clone, Default, Deserialize, Debug)]
pub struct InfluencerFilter {
    pub field: Option<String>,
    pub city: Option<String>,
    pub name: Option<String>,
}

pub trait ProfileStore: Send + Sync {
    /// Inserts or replaces the influencer profile keyed by its email.
    fn upsert_influencer(&self, profile: &InfluencerProfile) -> Result<()>;

    /// Inserts or replaces the collaborator profile keyed by its email.
    fn upsert_collaborator(&self, profile: &CollaboratorProfile) -> Result<()>;

    /// Returns Ok(None) when no profile has been saved yet.
    fn get_influencer(&self, email: &str) -> Result<Option<InfluencerProfile>>;

    fn get_collaborator(&self, email: &str) -> Result<Option<CollaboratorProfile>>;

    /// Every influencer profile, in insertion order.
    fn all_influencers(&self) -> Result<Vec<InfluencerProfile>>;

    /// Influencer profiles matching all present criteria, in insertion order.
    fn search_influencers(&self, filter: &InfluencerFilter) -> Result<Vec<InfluencerProfile>>;

    /// Distinct cities among influencers whose field contains the given
    /// substring, sorted alphabetically.
    fn distinct_cities_for_field(&self, field: &str) -> Result<Vec<String>>;

    /// Removes whatever profile rows the email owns, in either table.
    fn delete_for_email(&self, email: &str) -> Result<()>;
}
