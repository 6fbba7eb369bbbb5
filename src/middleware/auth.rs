use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::principal::{Principal, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    /// `role: "admin"` grants review rights; anything else is an applicant.
    pub fn principal(&self) -> Principal {
        let role = match self.role.as_deref() {
            Some(r) if r.eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::Applicant,
        };
        Principal {
            id: self.sub.clone(),
            role,
        }
    }
}

/// Key material for bearer token verification.
#[derive(Clone)]
pub struct AuthState {
    key: Arc<DecodingKey>,
}

impl AuthState {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            key: Arc::new(DecodingKey::from_secret(jwt_secret.as_bytes())),
        }
    }

    fn resolve(&self, headers: &HeaderMap) -> Result<Principal, Response> {
        let Some(auth_header) = headers.get(AUTHORIZATION) else {
            return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
        };
        let Ok(auth_str) = auth_header.to_str() else {
            return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
        };
        let Some(token) = auth_str.strip_prefix("Bearer ") else {
            return Err(reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"));
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        match decode::<Claims>(token, &self.key, &validation) {
            Ok(data) if !data.claims.sub.trim().is_empty() => Ok(data.claims.principal()),
            Ok(_) | Err(_) => Err(reject(StatusCode::UNAUTHORIZED, "invalid_token")),
        }
    }
}

fn reject(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

/// Any authenticated caller; the resolved `Principal` is placed in request
/// extensions.
pub async fn require_principal(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    match auth.resolve(req.headers()) {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

pub async fn require_admin(State(auth): State<AuthState>, mut req: Request, next: Next) -> Response {
    match auth.resolve(req.headers()) {
        Ok(principal) if principal.is_admin() => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Ok(principal) => {
            tracing::warn!("Non-admin {} denied admin route {}", principal.id, req.uri().path());
            reject(StatusCode::FORBIDDEN, "forbidden")
        }
        Err(resp) => resp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_claim_maps_to_principal() {
        let admin = Claims {
            sub: "u1".into(),
            exp: 0,
            role: Some("Admin".into()),
        };
        assert!(admin.principal().is_admin());

        let user = Claims {
            sub: "u2".into(),
            exp: 0,
            role: None,
        };
        assert_eq!(user.principal(), Principal::applicant("u2"));
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let auth = AuthState::new("secret");
        let resp = auth.resolve(&HeaderMap::new()).unwrap_err();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
