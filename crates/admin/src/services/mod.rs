//! Business services composing the stores and the Shopify client.

pub mod scripts;
pub mod sync;

pub use scripts::{ScriptError, ScriptService};
pub use sync::{PushOutcome, SyncClient};
