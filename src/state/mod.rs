//! State module for tracking crawl and session progress
//!
//! # Components
//!
//! - `CrawlState`: Lifecycle of a whole crawl (idle, running, completed, cancelled)
//! - `AuthState`: Lifecycle of the authenticated session owned by the authenticator

mod auth_state;
mod crawl_state;

// Re-export main types
pub use auth_state::{AuthState, CredentialMaterial};
pub use crawl_state::CrawlState;
