//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the verified user
//! in `x-user-id` and `x-user-role`.

use std::str::FromStr;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            other => Err(ApiError::Unauthorized(format!("Unknown role {:?}", other))),
        }
    }
}

/// The authenticated user making the request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Fail with 403 unless the caller has one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Access denied".to_string()))
        }
    }

    /// Admins, or the doctor whose calendar this is.
    pub fn require_doctor_or_admin(&self, doctor_id: &str) -> Result<(), ApiError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Doctor if self.user_id == doctor_id => Ok(()),
            _ => Err(ApiError::Forbidden("Access denied".to_string())),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Not authorized".to_string()))?;
        let role = header(parts, USER_ROLE_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Not authorized".to_string()))?
            .parse()?;

        Ok(Caller::new(user_id, role))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
