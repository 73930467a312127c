// Core of the pantry assistant:
// - Chat transport client for the remote assistant service
// - Extraction of embedded "buy ingredients" directives
// - Cart selection and session state
// - Configuration loading
// - Shared error types

pub mod client;
pub use client::*;

pub mod directive;
pub use directive::*;

pub mod types;
pub use types::*;

pub mod cart;
pub use cart::*;

pub mod session;
pub use session::ChatSession;

pub mod config;
pub use config::*;

pub mod errors;
pub use errors::*;
