use serde::{Deserialize, Serialize};

/// The role an account signed up with. Exactly one per identity; every
/// gated operation matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Influencer,
    Collaborator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Influencer => "Influencer",
            Role::Collaborator => "Collaborator",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "influencer" => Some(Role::Influencer),
            "collaborator" => Some(Role::Collaborator),
            _ => None,
        }
    }
}
