//! Bearer-token identity
//!
//! Every request gets an [`Identity`] extension. A valid RS256 access token
//! yields the owner named by its `sub` claim; no token yields an anonymous
//! identity, which the agenda operations reject as unauthenticated. A token
//! that is present but invalid is refused outright.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::{error::AgendaError, models::OwnerId, state::AppState};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Owner ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Who is calling, if anyone
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity(pub Option<OwnerId>);

/// Validates access tokens against the configured public key
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn from_rsa_pem(pem: &str) -> anyhow::Result<Self> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> Result<OwnerId, AgendaError> {
        jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| OwnerId(data.claims.sub))
            .map_err(|e| {
                warn!("Rejected access token: {}", e);
                AgendaError::Unauthenticated
            })
    }
}

/// Identity middleware
pub async fn identity_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AgendaError> {
    let owner = match (bearer, &state.verifier) {
        (None, _) => None,
        (Some(TypedHeader(Authorization(bearer))), Some(verifier)) => {
            Some(verifier.verify(bearer.token())?)
        }
        (Some(_), None) => {
            warn!("Bearer token sent but no public key is configured");
            return Err(AgendaError::Unauthenticated);
        }
    };

    req.extensions_mut().insert(Identity(owner));

    Ok(next.run(req).await)
}
