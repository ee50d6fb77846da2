//! Versioned cart state with optimistic concurrency control.
//!
//! Each cart instance owns one [`StateDocument`] stored next to a
//! monotonically advancing [`Version`]. Reads return both. `setState` only
//! commits when the caller presents the current version, while `update` and
//! `clean` always apply to whatever document is current.

pub mod cart;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod request;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

pub use cart::{LineItem, StateDocument};
pub use config::CartConfig;
pub use error::CartError;
pub use policy::{AccessPolicy, Caller, Decision, PolicyVariant};
pub use request::{Operation, Request};
pub use service::{CartService, Response, Status};
pub use types::{CartId, Version, Versioned};
