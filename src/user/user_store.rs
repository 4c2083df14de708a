use super::auth::{AuthToken, AuthTokenValue, PasswordCredentials};
use super::roles::Role;
use super::user_models::UserAccount;
use anyhow::Result;

pub trait CredentialsStore: Send + Sync {
    /// Returns the password credentials for the given email.
    /// Returns Ok(None) if no credentials exist.
    /// Returns Err if there is a database error.
    fn get_credentials(&self, email: &str) -> Result<Option<PasswordCredentials>>;

    /// Replaces the password credentials for the email they carry.
    fn update_credentials(&self, credentials: PasswordCredentials) -> Result<()>;
}

pub trait AuthTokenStore: Send + Sync {
    /// Returns an auth token given its value.
    /// Returns Ok(None) if the token does not exist.
    /// Returns Err if there is a database error.
    fn get_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token given the token value.
    /// Returns Ok(None) if the token does not exist.
    /// Returns Err if there is a database error.
    fn delete_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Updates an auth token with the latest timestamp.
    fn update_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    /// Adds a new auth token.
    fn add_auth_token(&self, token: AuthToken) -> Result<()>;

    /// Deletes all auth tokens issued to the given email.
    /// Returns the number of tokens deleted.
    fn delete_auth_tokens_for_email(&self, email: &str) -> Result<usize>;

    /// Prunes auth tokens older than the given age, in days.
    /// Returns the number of tokens that were deleted.
    fn prune_expired_auth_tokens(&self, max_age_days: u64) -> Result<usize>;
}

pub trait UserStore: AuthTokenStore + CredentialsStore + Send + Sync {
    /// Creates a new account. Returns Ok(false) without touching the
    /// database when an account with that email already exists.
    fn create_account(&self, email: &str, role: Role) -> Result<bool>;

    /// Returns the account for the given email.
    /// Returns Ok(None) if the account does not exist.
    /// Returns Err if there is a database error.
    fn get_account(&self, email: &str) -> Result<Option<UserAccount>>;

    /// Returns all accounts, in insertion order.
    fn get_all_accounts(&self) -> Result<Vec<UserAccount>>;

    /// Flips the enabled flag on an account.
    /// Returns Ok(false) if the account does not exist.
    fn set_account_enabled(&self, email: &str, enabled: bool) -> Result<bool>;

    /// Deletes an account together with its credentials and tokens.
    /// Returns Ok(false) if the account does not exist.
    fn delete_account(&self, email: &str) -> Result<bool>;
}
