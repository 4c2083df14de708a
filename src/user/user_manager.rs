use super::{
    auth::{AuthToken, AuthTokenValue, CredentialHasher, PasswordCredentials},
    user_models::{AuthenticatedUser, UserAccount},
    Role, UserStore,
};
use crate::error::DomainError;
use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};

fn persistence(err: anyhow::Error) -> DomainError {
    DomainError::Persistence(err.to_string())
}

/// Account lifecycle and authentication on top of a [`UserStore`].
pub struct UserManager {
    user_store: Arc<Mutex<Box<dyn UserStore>>>,
}

impl UserManager {
    pub fn new(user_store: Box<dyn UserStore>) -> Self {
        Self {
            user_store: Arc::new(Mutex::new(user_store)),
        }
    }

    pub fn register(&self, email: &str, password: &str, role: Role) -> Result<(), DomainError> {
        let store = self.user_store.lock().unwrap();
        let created = store.create_account(email, role).map_err(persistence)?;
        if !created {
            return Err(DomainError::DuplicateIdentity);
        }
        let credentials = Self::create_hashed_password(email, password)?;
        store.update_credentials(credentials).map_err(persistence)
    }

    pub fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, DomainError> {
        let store = self.user_store.lock().unwrap();
        let account = store
            .get_account(email)
            .map_err(persistence)?
            .ok_or(DomainError::NotFound)?;
        if !account.enabled {
            return Err(DomainError::Disabled);
        }
        let credentials = store
            .get_credentials(email)
            .map_err(persistence)?
            .ok_or(DomainError::InvalidCredential)?;
        let matches = credentials
            .hasher
            .verify(password, &credentials.hash)
            .map_err(persistence)?;
        if !matches {
            return Err(DomainError::InvalidCredential);
        }
        Ok(AuthenticatedUser {
            email: account.email,
            role: account.role,
        })
    }

    /// Admin console login. Failures never reveal whether the account
    /// exists or which role it has.
    pub fn admin_authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, DomainError> {
        match self.authenticate(email, password) {
            Ok(user) if user.role == Role::Admin => Ok(user),
            Ok(_) => Err(DomainError::InvalidCredential),
            Err(DomainError::NotFound) | Err(DomainError::Disabled) => {
                Err(DomainError::InvalidCredential)
            }
            Err(err) => Err(err),
        }
    }

    pub fn change_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let store = self.user_store.lock().unwrap();
        let credentials = store
            .get_credentials(email)
            .map_err(persistence)?
            .ok_or(DomainError::InvalidCredential)?;
        let matches = credentials
            .hasher
            .verify(old_password, &credentials.hash)
            .map_err(persistence)?;
        if !matches {
            return Err(DomainError::InvalidCredential);
        }
        let new_credentials = Self::create_hashed_password(email, new_password)?;
        store
            .update_credentials(new_credentials)
            .map_err(persistence)
    }

    pub fn issue_auth_token(&self, email: &str) -> Result<AuthToken, DomainError> {
        let token = AuthToken {
            email: email.to_string(),
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store
            .lock()
            .unwrap()
            .add_auth_token(token.clone())
            .map_err(persistence)?;
        Ok(token)
    }

    pub fn revoke_auth_token(&self, value: &AuthTokenValue) -> Result<(), DomainError> {
        self.user_store
            .lock()
            .unwrap()
            .delete_auth_token(value)
            .map_err(persistence)?;
        Ok(())
    }

    /// Resolves a session token to its identity. Expired tokens are deleted
    /// on the spot; tokens of disabled accounts resolve to None.
    pub fn resolve_session(
        &self,
        value: &AuthTokenValue,
        max_age_days: u64,
    ) -> Result<Option<AuthenticatedUser>, DomainError> {
        let store = self.user_store.lock().unwrap();
        let token = match store.get_auth_token(value).map_err(persistence)? {
            Some(token) => token,
            None => return Ok(None),
        };

        let expiry = token.created + Duration::from_secs(max_age_days * 24 * 60 * 60);
        if SystemTime::now() >= expiry {
            store.delete_auth_token(value).map_err(persistence)?;
            return Ok(None);
        }

        let account = match store.get_account(&token.email).map_err(persistence)? {
            Some(account) => account,
            None => return Ok(None),
        };
        if !account.enabled {
            return Ok(None);
        }

        store
            .update_auth_token_last_used_timestamp(value)
            .map_err(persistence)?;

        Ok(Some(AuthenticatedUser {
            email: account.email,
            role: account.role,
        }))
    }

    pub fn list_users(&self) -> Result<Vec<UserAccount>, DomainError> {
        self.user_store
            .lock()
            .unwrap()
            .get_all_accounts()
            .map_err(persistence)
    }

    pub fn get_account(&self, email: &str) -> Result<Option<UserAccount>, DomainError> {
        self.user_store
            .lock()
            .unwrap()
            .get_account(email)
            .map_err(persistence)
    }

    pub fn set_enabled(
        &self,
        email: &str,
        enabled: bool,
        acting_admin: &str,
    ) -> Result<(), DomainError> {
        if email == acting_admin {
            return Err(DomainError::Forbidden);
        }
        let store = self.user_store.lock().unwrap();
        let updated = store
            .set_account_enabled(email, enabled)
            .map_err(persistence)?;
        if !updated {
            return Err(DomainError::NotFound);
        }
        if !enabled {
            store.delete_auth_tokens_for_email(email).map_err(persistence)?;
        }
        Ok(())
    }

    pub fn delete_user(&self, email: &str, acting_admin: &str) -> Result<(), DomainError> {
        if email == acting_admin {
            return Err(DomainError::Forbidden);
        }
        let deleted = self
            .user_store
            .lock()
            .unwrap()
            .delete_account(email)
            .map_err(persistence)?;
        if !deleted {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    pub fn prune_expired_auth_tokens(&self, max_age_days: u64) -> Result<usize, DomainError> {
        self.user_store
            .lock()
            .unwrap()
            .prune_expired_auth_tokens(max_age_days)
            .map_err(persistence)
    }

    fn create_hashed_password(
        email: &str,
        password: &str,
    ) -> Result<PasswordCredentials, DomainError> {
        let hasher = CredentialHasher::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher
            .hash(password.as_bytes(), &salt)
            .map_err(persistence)?;
        Ok(PasswordCredentials {
            email: email.to_string(),
            salt,
            hash,
            hasher,
            created: SystemTime::now(),
        })
    }
}
