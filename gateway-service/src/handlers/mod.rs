//! HTTP handlers. Each is thin glue over the services layer.

pub mod api_keys;
pub mod auth;
pub mod health;
pub mod operators;
pub mod users;
