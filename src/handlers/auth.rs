// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::staff::{LoginRequest, StaffRole, fetch_staff_by_email},
    utils::{hash::verify_password, jwt::sign_jwt},
};

/// Shared login flow for all three staff tables.
///
/// Looks the account up by email, verifies the Argon2 hash and signs a JWT
/// carrying role and tenant. A wrong email and a wrong password answer
/// identically.
async fn login_staff(
    pool: &PgPool,
    config: &Config,
    role: StaffRole,
    payload: LoginRequest,
) -> Result<impl IntoResponse + use<>, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let account = fetch_staff_by_email(pool, role, &payload.email)
        .await?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &account.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        account.id,
        role,
        account.university_id,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "type": "Bearer",
        "name": account.name,
        "role": role.as_str(),
    })))
}

/// Authenticates a teacher.
pub async fn teacher_login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    login_staff(&pool, &config, StaffRole::Teacher, payload).await
}

/// Authenticates a university admin.
pub async fn university_admin_login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    login_staff(&pool, &config, StaffRole::UniversityAdmin, payload).await
}

/// Authenticates the super admin.
pub async fn super_admin_login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    login_staff(&pool, &config, StaffRole::SuperAdmin, payload).await
}
