//! Fixed token table, for local development and tests

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{IdentityError, Result};
use crate::{Claims, IdentityVerifier};

/// Accepts only the tokens it was built with
#[derive(Debug, Default, Clone)]
pub struct StaticVerifier {
    tokens: HashMap<String, Claims>,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token that resolves to `claims`
    pub fn with_token(mut self, token: impl Into<String>, claims: Claims) -> Self {
        self.tokens.insert(token.into(), claims);
        self
    }

    /// Register a token for a plain email identity
    pub fn with_email(self, token: impl Into<String>, email: impl Into<String>) -> Self {
        self.with_token(
            token,
            Claims {
                email: Some(email.into()),
                email_verified: true,
                ..Default::default()
            },
        )
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<Claims> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::invalid("unknown token"))
    }
}
