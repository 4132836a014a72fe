// src/models/staff.rs

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, prelude::FromRow};
use validator::Validate;

use crate::error::AppError;

/// Staff roles carried in JWT claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffRole {
    Teacher,
    UniversityAdmin,
    SuperAdmin,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Teacher => "teacher",
            StaffRole::UniversityAdmin => "university_admin",
            StaffRole::SuperAdmin => "super_admin",
        }
    }
}

/// One row of any of the three staff tables. Super admins are not bound to a
/// university, so `university_id` is optional.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StaffAccount {
    pub id: i64,
    pub email: String,

    /// Argon2 hash. Skipped during serialization.
    #[serde(skip)]
    pub password: String,

    pub name: String,
    pub university_id: Option<i64>,
}

/// DTO for all three login endpoints.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
    #[validate(length(min = 1, max = 128, message = "Password is required."))]
    pub password: String,
}

/// Fetches a staff account by email from the table matching the role.
pub async fn fetch_staff_by_email(
    pool: &PgPool,
    role: StaffRole,
    email: &str,
) -> Result<Option<StaffAccount>, AppError> {
    let sql = match role {
        StaffRole::Teacher => {
            "SELECT id, email, password, name, university_id FROM teachers_details WHERE email = $1"
        }
        StaffRole::UniversityAdmin => {
            "SELECT id, email, password, name, university_id FROM university_admins WHERE email = $1"
        }
        StaffRole::SuperAdmin => {
            "SELECT id, email, password, name, NULL::BIGINT AS university_id FROM super_admins WHERE email = $1"
        }
    };

    let account = sqlx::query_as::<_, StaffAccount>(sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(account)
}
