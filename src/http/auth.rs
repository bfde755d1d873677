//! Admin role tokens and verification

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::util::time::unix_secs;
use crate::ws::protocol::Role;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Claims carried by a role token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleClaims {
    /// Subject (operator name)
    pub sub: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Sign claims into a `header.payload.signature` token
pub fn sign_token(claims: &RoleClaims, secret: &str) -> Result<String, AuthError> {
    let header_b64 = URL_SAFE_NO_PAD.encode(TOKEN_HEADER);
    let payload = serde_json::to_vec(claims).map_err(|_| AuthError::InvalidToken)?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);

    let message = format!("{}.{}", header_b64, payload_b64);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(message.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", message, signature_b64))
}

/// Verify a token and extract claims
pub fn verify_token(token: &str, secret: &str) -> Result<RoleClaims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidToken);
    }

    let header_b64 = parts[0];
    let payload_b64 = parts[1];
    let signature_b64 = parts[2];

    let message = format!("{}.{}", header_b64, payload_b64);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(message.as_bytes());

    let provided_signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::InvalidToken)?;
    mac.verify_slice(&provided_signature)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AuthError::InvalidToken)?;
    let claims: RoleClaims = serde_json::from_slice(&payload_json)
        .map_err(|_| AuthError::InvalidToken)?;

    if claims.exp < unix_secs() {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Decide the role granted to a connection requesting `requested`.
///
/// Viewers need no token. Admins need a valid admin token when a secret is
/// configured; without a secret every admin request is granted.
pub fn authorize_role(
    requested: Role,
    token: Option<&str>,
    secret: Option<&str>,
) -> Result<Role, AuthError> {
    match (requested, secret) {
        (Role::Viewer, _) => Ok(Role::Viewer),
        (Role::Admin, None) => Ok(Role::Admin),
        (Role::Admin, Some(secret)) => {
            let token = token.ok_or(AuthError::MissingToken)?;
            let claims = verify_token(token, secret)?;
            if claims.role != Role::Admin {
                return Err(AuthError::Forbidden);
            }
            Ok(Role::Admin)
        }
    }
}

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing role token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token does not grant the admin role")]
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
        };

        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn claims(role: Role, exp: u64) -> RoleClaims {
        RoleClaims {
            sub: "operator".into(),
            role,
            exp,
        }
    }

    #[test]
    fn signed_token_verifies() {
        let token = sign_token(&claims(Role::Admin, unix_secs() + 60), SECRET).unwrap();
        let verified = verify_token(&token, SECRET).unwrap();
        assert_eq!(verified.role, Role::Admin);
        assert_eq!(verified.sub, "operator");
    }

    #[test]
    fn wrong_secret_or_tampering_is_rejected() {
        let token = sign_token(&claims(Role::Admin, unix_secs() + 60), SECRET).unwrap();
        assert_eq!(verify_token(&token, "other"), Err(AuthError::InvalidToken));

        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        parts[1] = URL_SAFE_NO_PAD.encode(r#"{"sub":"x","role":"admin","exp":99999999999}"#);
        assert_eq!(verify_token(&parts.join("."), SECRET), Err(AuthError::InvalidToken));

        assert_eq!(verify_token("not-a-token", SECRET), Err(AuthError::InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = sign_token(&claims(Role::Admin, 1), SECRET).unwrap();
        assert_eq!(verify_token(&token, SECRET), Err(AuthError::TokenExpired));
    }

    #[test]
    fn role_gate() {
        let admin = sign_token(&claims(Role::Admin, unix_secs() + 60), SECRET).unwrap();
        let viewer = sign_token(&claims(Role::Viewer, unix_secs() + 60), SECRET).unwrap();

        assert_eq!(authorize_role(Role::Viewer, None, Some(SECRET)), Ok(Role::Viewer));
        assert_eq!(authorize_role(Role::Admin, None, None), Ok(Role::Admin));
        assert_eq!(authorize_role(Role::Admin, Some(&admin), Some(SECRET)), Ok(Role::Admin));
        assert_eq!(
            authorize_role(Role::Admin, None, Some(SECRET)),
            Err(AuthError::MissingToken)
        );
        assert_eq!(
            authorize_role(Role::Admin, Some(&viewer), Some(SECRET)),
            Err(AuthError::Forbidden)
        );
    }
}
