//! FocusBubble Identity
//!
//! Verifies opaque identity tokens against an external provider and returns
//! the claims the server needs to find or create a user.

mod error;
mod google;
mod stub;

pub use error::{IdentityError, Result};
pub use google::GoogleVerifier;
pub use stub::StaticVerifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Verified identity claims
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Provider-side subject identifier
    pub sub: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Trait for identity verification backends
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a token; any malformed, expired or audience-mismatched token is rejected
    async fn verify(&self, token: &str) -> Result<Claims>;
}
