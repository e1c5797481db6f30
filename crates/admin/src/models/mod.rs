//! Domain models for the admin service.

pub mod credentials;
pub mod script;

pub use credentials::{CredentialsInput, ShopifyCredentials};
pub use script::{DeleteOutcome, NewScript, ScriptDefinition, ScriptPatch};
