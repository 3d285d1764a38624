//! Identity provider backed by accounts in the config file

use async_trait::async_trait;
use tracing::{debug, error};

use super::{password::verify_password, Identity, IdentityProvider, INVALID_CREDENTIALS};
use crate::config::LocalUser;
use crate::error::{ArchiveError, Result};

pub struct LocalIdentityProvider {
    users: Vec<LocalUser>,
}

impl LocalIdentityProvider {
    pub fn new(users: Vec<LocalUser>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let Some(user) = self
            .users
            .iter()
            .find(|u| u.email.trim().eq_ignore_ascii_case(email.trim()))
        else {
            debug!(email, "Unknown local account");
            return Err(ArchiveError::Auth(INVALID_CREDENTIALS.to_string()));
        };

        // Argon2 verification blocks for tens of milliseconds
        let hash = user.password_hash.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| {
                error!(error = %e, "Password check task failed");
                ArchiveError::Auth("password check failed".to_string())
            })??;

        if !matches {
            return Err(ArchiveError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        let email = user.email.trim().to_lowercase();
        Ok(Identity {
            id: email.clone(),
            email,
        })
    }
}
