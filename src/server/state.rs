use axum::extract::FromRef;

use crate::events::EventStore;
use crate::mailer::Mailer;
use crate::media::MediaStore;
use crate::profile::ProfileStore;
use crate::user::UserManager;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::ServerConfig;

pub type GuardedUserManager = Arc<Mutex<UserManager>>;
pub type GuardedProfileStore = Arc<dyn ProfileStore>;
pub type GuardedEventStore = Arc<dyn EventStore>;
pub type GuardedMediaStore = Arc<dyn MediaStore>;
pub type GuardedMailer = Arc<dyn Mailer>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub user_manager: GuardedUserManager,
    pub profile_store: GuardedProfileStore,
    pub event_store: GuardedEventStore,
    pub media_store: GuardedMediaStore,
    pub mailer: GuardedMailer,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedProfileStore {
    fn from_ref(input: &ServerState) -> Self {
        input.profile_store.clone()
    }
}

impl FromRef<ServerState> for GuardedEventStore {
    fn from_ref(input: &ServerState) -> Self {
        input.event_store.clone()
    }
}

impl FromRef<ServerState> for GuardedMediaStore {
    fn from_ref(input: &ServerState) -> Self {
        input.media_store.clone()
    }
}

impl FromRef<ServerState> for GuardedMailer {
    fn from_ref(input: &ServerState) -> Self {
        input.mailer.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
