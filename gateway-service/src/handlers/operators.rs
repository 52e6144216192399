use axum::{response::IntoResponse, Json};
use serde_json::json;

use crate::middleware::CurrentAuth;

/// Reachable only by callers holding operator capability.
pub async fn ping(CurrentAuth(caller): CurrentAuth) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "account_id": caller.account_id(),
        "operator_id": caller.operator_id(),
        "kind": caller.kind(),
    }))
}
