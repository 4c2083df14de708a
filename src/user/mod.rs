mod auth;
mod roles;
mod sqlite_user_store;
mod user_manager;
mod user_models;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, CredentialHasher, PasswordCredentials};
pub use roles::Role;
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::UserManager;
pub use user_models::{AuthenticatedUser, UserAccount};
pub use user_store::{AuthTokenStore, CredentialsStore, UserStore};
