use secrecy::SecretString;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::UserWritePayload;

#[derive(Debug, Deserialize, Validate)]
pub struct BootstrapRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Body of `POST /users`. The role stays a string so the lifecycle hook
/// decides what is valid.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    pub id: Option<Uuid>,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub role: String,

    #[serde(default)]
    pub is_operator: bool,

    pub operator_id: Option<Uuid>,

    pub active: Option<bool>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

impl From<CreateUserRequest> for UserWritePayload {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            id: req.id,
            email: Some(req.email),
            role: Some(req.role),
            identity_id: None,
            operator_id: req.operator_id,
            active: req.active,
            is_operator: req.is_operator,
            password: req.password.map(SecretString::new),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub role: Option<String>,

    #[serde(default)]
    pub is_operator: bool,

    pub operator_id: Option<Uuid>,

    pub active: Option<bool>,
}

impl From<UpdateUserRequest> for UserWritePayload {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            email: req.email,
            role: req.role,
            operator_id: req.operator_id,
            active: req.active,
            is_operator: req.is_operator,
            ..Default::default()
        }
    }
}
