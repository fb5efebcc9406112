//! Session store.
//!
//! Holds the logged-in user and bearer token, mirrored to durable storage
//! under the `token` and `user` keys. The initial session is read
//! synchronously from storage; only [`SessionStore::login`] and
//! [`SessionStore::logout`] change it afterwards.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use vivahart_core::Email;

use crate::api::BackendClient;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::User;
use crate::storage::{DurableStorage, keys};

/// In-memory view of the current session.
///
/// The session counts as authenticated whenever a token is present, even if
/// the stored user record was lost.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
    token: Option<SecretString>,
}

impl Session {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }
}

/// Owner of the session and its persisted form.
pub struct SessionStore {
    storage: Arc<dyn DurableStorage>,
    session: Session,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Restore the session from storage.
    ///
    /// Unreadable storage or an unparsable user record leaves the
    /// corresponding part of the session empty; neither is an error.
    pub fn load(storage: Arc<dyn DurableStorage>) -> Self {
        let token = match storage.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
            Err(e) => {
                warn!(error = %e, "Could not read stored token, starting anonymous");
                None
            }
        };

        let user = match storage.get(keys::USER) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Stored user record is unreadable, ignoring it");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Could not read stored user record");
                None
            }
        };

        if let Some(user) = token.as_ref().and(user.as_ref()) {
            set_sentry_user(&user.id, Some(user.email.as_str()));
        }

        Self {
            storage,
            session: Session { user, token },
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.session.user()
    }

    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.session.token()
    }

    /// The bearer token, or `AuthError::NotLoggedIn`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` for an anonymous session.
    pub fn require_token(&self) -> Result<&SecretString, AuthError> {
        self.session.token().ok_or(AuthError::NotLoggedIn)
    }

    /// Log in with email and password.
    ///
    /// On any failure the previous session, in memory and in storage, is
    /// left as it was.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` before any request if the email is
    /// malformed, `AuthError::InvalidCredentials` if the backend rejects the
    /// pair, and `AuthError::Backend` if it cannot be reached.
    #[instrument(skip(self, api, password))]
    pub async fn login(
        &mut self,
        api: &BackendClient,
        email: &str,
        password: &SecretString,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        if password.expose_secret().is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        let result = api.login(&email, password).await?;
        self.persist(&result.token, &result.user)?;

        set_sentry_user(&result.user.id, Some(result.user.email.as_str()));
        info!(user_id = %result.user.id, "Logged in");

        let user = result.user.clone();
        self.session = Session {
            user: Some(result.user),
            token: Some(result.token),
        };
        Ok(user)
    }

    fn persist(&self, token: &SecretString, user: &User) -> Result<(), AuthError> {
        let user_json = serde_json::to_string(user)?;
        let written = self
            .storage
            .set(keys::TOKEN, token.expose_secret())
            .and_then(|()| self.storage.set(keys::USER, &user_json));

        if let Err(e) = written {
            // Don't leave a half-written session behind.
            for key in [keys::TOKEN, keys::USER] {
                if let Err(cleanup) = self.storage.remove(key) {
                    warn!(key, error = %cleanup, "Could not roll back session key");
                }
            }
            self.restore_previous();
            return Err(e.into());
        }
        Ok(())
    }

    /// Write the in-memory session back after a failed persist.
    fn restore_previous(&self) {
        let Some(token) = self.session.token() else {
            return;
        };
        let restored = self.storage.set(keys::TOKEN, token.expose_secret()).and_then(|()| {
            match self.session.user().map(serde_json::to_string) {
                Some(Ok(json)) => self.storage.set(keys::USER, &json),
                _ => Ok(()),
            }
        });
        if let Err(e) = restored {
            warn!(error = %e, "Could not restore previous session to storage");
        }
    }

    /// Log out: clear all durable storage and reset the session.
    ///
    /// Never fails and never touches the network. Storage errors are logged.
    #[instrument(skip(self))]
    pub fn logout(&mut self) {
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Could not clear storage, removing known keys instead");
            for key in [keys::TOKEN, keys::USER, keys::CART_ITEMS] {
                if let Err(e) = self.storage.remove(key) {
                    warn!(key, error = %e, "Could not remove storage key");
                }
            }
        }

        let was_authenticated = self.session.is_authenticated();
        self.session = Session::default();
        clear_sentry_user();

        if was_authenticated {
            info!("Logged out");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    const USER_JSON: &str =
        r#"{"id":"u1","email":"asha@example.com","firstName":"Asha","lastName":"Rao"}"#;

    fn storage() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new())
    }

    #[test]
    fn test_load_empty_is_anonymous() {
        let store = SessionStore::load(storage());
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert!(matches!(store.require_token(), Err(AuthError::NotLoggedIn)));
    }

    #[test]
    fn test_load_restores_token_and_user() {
        let storage = storage();
        storage.set(keys::TOKEN, "T").unwrap();
        storage.set(keys::USER, USER_JSON).unwrap();

        let store = SessionStore::load(storage);
        assert!(store.is_authenticated());
        assert_eq!(store.user().unwrap().first_name, "Asha");
    }

    #[test]
    fn test_load_corrupt_user_keeps_token() {
        let storage = storage();
        storage.set(keys::TOKEN, "T").unwrap();
        storage.set(keys::USER, "{not json").unwrap();

        let store = SessionStore::load(storage);
        assert!(store.is_authenticated());
        assert!(store.user().is_none());
    }

    #[test]
    fn test_logout_clears_everything_and_is_idempotent() {
        let storage = storage();
        storage.set(keys::TOKEN, "T").unwrap();
        storage.set(keys::USER, USER_JSON).unwrap();
        storage.set(keys::CART_ITEMS, "[]").unwrap();

        let mut store = SessionStore::load(storage.clone());
        store.logout();
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());

        store.logout();
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
    }
}
