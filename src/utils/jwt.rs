// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, models::staff::StaffRole};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the staff account ID (as string).
    pub sub: String,
    /// Staff role: 'teacher', 'university_admin' or 'super_admin'.
    pub role: String,
    /// Tenant the account belongs to. Absent for super admins.
    pub university_id: Option<i64>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn is_super_admin(&self) -> bool {
        self.role == StaffRole::SuperAdmin.as_str()
    }
}

/// Signs a new JWT for a staff account.
pub fn sign_jwt(
    id: i64,
    role: StaffRole,
    university_id: Option<i64>,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        role: role.as_str().to_owned(),
        university_id,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// If valid, injects `Claims` into the request extensions for handlers to use.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Tenant scoping: the caller may only see data of their own university.
/// Super admins see every tenant.
pub fn require_university_scope(claims: &Claims, university_id: i64) -> Result<(), AppError> {
    if claims.is_super_admin() || claims.university_id == Some(university_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not allowed for this university".to_string(),
        ))
    }
}

/// University the caller is scoped to; `BadRequest` when a super admin calls
/// an endpoint that needs a tenant without naming one.
pub fn scoped_university(claims: &Claims, requested: Option<i64>) -> Result<i64, AppError> {
    if let Some(university_id) = claims.university_id {
        // Tenant-bound staff cannot ask for another university.
        if requested.is_some_and(|r| r != university_id) {
            return Err(AppError::Forbidden(
                "Not allowed for this university".to_string(),
            ));
        }
        return Ok(university_id);
    }
    requested.ok_or_else(|| AppError::BadRequest("university_id is required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: StaffRole, university_id: Option<i64>) -> Claims {
        Claims {
            sub: "1".into(),
            role: role.as_str().into(),
            university_id,
            exp: 0,
        }
    }

    #[test]
    fn tenant_scope_checks() {
        let teacher = claims(StaffRole::Teacher, Some(7));
        assert!(require_university_scope(&teacher, 7).is_ok());
        assert!(require_university_scope(&teacher, 8).is_err());

        let root = claims(StaffRole::SuperAdmin, None);
        assert!(require_university_scope(&root, 8).is_ok());
    }

    #[test]
    fn scoped_university_resolution() {
        let teacher = claims(StaffRole::Teacher, Some(7));
        assert_eq!(scoped_university(&teacher, None).unwrap(), 7);
        assert_eq!(scoped_university(&teacher, Some(7)).unwrap(), 7);
        assert!(scoped_university(&teacher, Some(8)).is_err());

        let root = claims(StaffRole::SuperAdmin, None);
        assert_eq!(scoped_university(&root, Some(3)).unwrap(), 3);
        assert!(scoped_university(&root, None).is_err());
    }

    #[test]
    fn jwt_round_trip() {
        let token = sign_jwt(42, StaffRole::UniversityAdmin, Some(7), "secret", 600).unwrap();
        let decoded = verify_jwt(&token, "secret").unwrap();
        assert_eq!(decoded.sub, "42");
        assert_eq!(decoded.role, "university_admin");
        assert_eq!(decoded.university_id, Some(7));

        assert!(verify_jwt(&token, "other-secret").is_err());
    }
}
