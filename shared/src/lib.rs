//! Shared types and models for the Uniform Allocation client
//!
//! This crate contains the wire models of the allocation service, the
//! locale and upload types, and the pure view builders used by both the
//! native client and the WASM bindings.

pub mod csv_check;
pub mod models;
pub mod types;
pub mod views;

pub use csv_check::*;
pub use models::*;
pub use types::*;
pub use views::*;
