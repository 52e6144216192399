//! Operator capability - side record granting automation/operator access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const OPERATOR_STATUS_ACTIVE: &str = "active";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OperatorCapability {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl OperatorCapability {
    /// New active capability, named after the account it is provisioned for.
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            status: OPERATOR_STATUS_ACTIVE.to_string(),
            created_at: Utc::now(),
        }
    }
}
