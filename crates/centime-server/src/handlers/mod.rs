//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod accounts;
pub mod import;
pub mod labels;
pub mod transactions;
pub mod users;

// Re-export all handlers for use in router
pub use accounts::*;
pub use import::*;
pub use labels::*;
pub use transactions::*;
pub use users::*;
