//! Wire types for the browser driver protocol.
//!
//! This crate contains the serde-serializable types used for communication
//! with the Playwright driver over JSON-RPC. These types represent the
//! "protocol layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization and
//!   small builder conveniences
//! - **1:1 with protocol**: Match the driver's protocol schema
//! - **Stable**: Changes only when the wire protocol changes
//!
//! Higher-level ergonomic APIs are built on top of these types in `drover`.

pub mod js;
pub mod options;
pub mod types;

pub use options::*;
pub use types::*;
