// Application layer - use cases over an injected ledger store

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
