//! Security primitives shared by the access filters.
//!
//! # Contents
//! ```text
//! dn.rs      → DistinguishedName (client certificate principals)
//! api_key.rs → ApiKey (credential passed as a named JSON-RPC parameter)
//! ```
//!
//! # Design Decisions
//! - Principal strings come from the transport and are attacker-influenced;
//!   parsing them never panics and reports a typed error instead
//! - API keys are compared by value

pub mod api_key;
pub mod dn;

pub use api_key::ApiKey;
pub use dn::{DistinguishedName, DnError};
