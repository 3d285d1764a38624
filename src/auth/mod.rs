//! Authentication and admin gating
//!
//! Provides:
//! - `IdentityProvider`: password sign-in (remote or local accounts)
//! - `AdminPolicy`: the single identity allowed to change the catalog
//! - `AuthGate`: per-session Anonymous/Authenticated state machine
//! - Password hashing with Argon2 for local accounts
//!
//! There are no roles. Exactly one configured email is the admin; everybody
//! else, signed in or not, can only read.

pub mod local;
pub mod password;
pub mod remote;

pub use local::LocalIdentityProvider;
pub use password::{hash_password, verify_password};
pub use remote::HttpIdentityProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ArchiveError, Result};

/// Message returned for any unknown email/password pair
pub const INVALID_CREDENTIALS: &str = "Invalid login credentials";

/// A signed-in identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// Identity provider boundary
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity>;
}

/// Ask the provider to verify an email/password pair
///
/// Empty credentials fail without contacting the provider.
pub async fn check_credentials(
    provider: &dyn IdentityProvider,
    email: &str,
    password: &str,
) -> Result<Identity> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ArchiveError::Auth("email and password are required".to_string()));
    }

    provider
        .sign_in_with_password(email.trim(), password)
        .await
        .map_err(|e| {
            warn!(email = %email.trim(), error = %e, "Sign-in failed");
            e
        })
}

/// Grants admin to exactly one email address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPolicy {
    admin_email: String,
}

impl AdminPolicy {
    pub fn new(admin_email: &str) -> Self {
        Self {
            admin_email: admin_email.trim().to_lowercase(),
        }
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        !self.admin_email.is_empty() && identity.email.trim().to_lowercase() == self.admin_email
    }
}

/// Session auth state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated { identity: Identity, is_admin: bool },
}

/// What the API reports about the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub signed_in: bool,
    pub email: Option<String>,
    pub is_admin: bool,
}

/// Per-session auth gate
#[derive(Debug, Clone)]
pub struct AuthGate {
    state: AuthState,
    policy: AdminPolicy,
}

impl AuthGate {
    pub fn new(policy: AdminPolicy) -> Self {
        Self {
            state: AuthState::Anonymous,
            policy,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            AuthState::Anonymous => None,
            AuthState::Authenticated { identity, .. } => Some(identity),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { is_admin: true, .. })
    }

    pub fn status(&self) -> AuthStatus {
        AuthStatus {
            signed_in: self.identity().is_some(),
            email: self.identity().map(|i| i.email.clone()),
            is_admin: self.is_admin(),
        }
    }

    /// Authenticate and derive the admin flag
    ///
    /// Any failure leaves the gate Anonymous.
    pub async fn sign_in(
        &mut self,
        provider: &dyn IdentityProvider,
        email: &str,
        password: &str,
    ) -> Result<AuthStatus> {
        let outcome = check_credentials(provider, email, password).await;
        self.complete_sign_in(outcome)
    }

    /// Record the outcome of `check_credentials`
    ///
    /// Lets callers run the provider call without holding the gate.
    pub fn complete_sign_in(&mut self, outcome: Result<Identity>) -> Result<AuthStatus> {
        self.state = AuthState::Anonymous;
        let identity = outcome?;

        let is_admin = self.policy.is_admin(&identity);
        info!(email = %identity.email, is_admin, "Signed in");

        self.state = AuthState::Authenticated { identity, is_admin };
        Ok(self.status())
    }

    pub fn sign_out(&mut self) {
        if let Some(identity) = self.identity() {
            info!(email = %identity.email, "Signed out");
        }
        self.state = AuthState::Anonymous;
    }

    /// Gate for catalog-changing actions
    pub fn require_admin(&self) -> Result<&Identity> {
        match &self.state {
            AuthState::Authenticated {
                identity,
                is_admin: true,
            } => Ok(identity),
            _ => Err(ArchiveError::AdminRequired),
        }
    }
}
