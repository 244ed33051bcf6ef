//! Identity collaborator: turns a bearer credential into `{id, role}`.

use crate::error::AppError;
use crate::model::ADMIN_ROLE;
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Authenticated caller. The role string is trusted exactly as issued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub role: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn identify(&self, token: &str) -> Result<Identity, AppError>;
}

/// Claims carried by tokens the identity service issues.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub role: String,
    pub exp: usize,
}

/// HS256 token verification with a shared secret.
pub struct JwtIdentity {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(secret: &[u8]) -> Self {
        JwtIdentity {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentity {
    async fn identify(&self, token: &str) -> Result<Identity, AppError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;
        Ok(Identity {
            id: data.claims.id,
            role: data.claims.role,
        })
    }
}
