use serde::{Deserialize, Serialize};

use std::time::SystemTime;

use crate::user::Role;

/// An identity as persisted. The email is the primary key everywhere,
/// profiles and events hang off it.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct UserAccount {
    pub email: String,
    pub role: Role,
    pub enabled: bool,
    pub created: SystemTime,
}

/// What a valid session resolves to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct AuthenticatedUser {
    pub email: String,
    pub role: Role,
}
