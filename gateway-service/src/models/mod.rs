pub mod account;
pub mod api_key;
pub mod auth_context;
pub mod operator;
pub mod payload;
pub mod role;

pub use account::{Account, AccountResponse, AccountRow};
pub use api_key::{ApiKey, ApiKeyRow, API_KEY_SECRET_BYTES};
pub use auth_context::{AuthContext, CredentialKind};
pub use operator::OperatorCapability;
pub use payload::{
    AccountDraft, ApiKeyWritePayload, PreparedApiKey, UserWritePayload, WriteMode,
};
pub use role::{InvalidRole, Role};
