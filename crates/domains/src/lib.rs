//! # domains
//!
//! The central domain logic and interface definitions for yamdb.
//! Nothing in here performs I/O: entities, validation rules, the access
//! control table and the ports that adapters implement.

pub mod errors;
pub mod models;
pub mod policy;
pub mod ports;
pub mod validation;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use policy::{authorize, decide, Action, Actor, Decision, Resource};
pub use ports::*;
