//! Runtime plumbing for driving a Playwright server process.
//!
//! This crate owns everything below the object model: locating a Node.js
//! runtime and driver script ([`driver`]), spawning and stopping the driver
//! process ([`server`]), framing JSON messages over its stdio pipes
//! ([`transport`]), and correlating requests, responses, and events on top
//! of that pipe ([`connection`]). Protocol objects themselves live in the
//! `drover` crate; everything here deals in guids and raw JSON.

pub mod channel;
pub mod channel_owner;
pub mod connection;
pub mod driver;
pub mod error;
pub mod server;
pub mod transport;

pub use channel::Channel;
pub use channel_owner::{ChannelOwner, ChannelOwnerImpl, DisposeReason, ParentOrConnection};
pub use connection::{Connection, ConnectionLike, Message, Metadata, ObjectFactory, ObjectStore};
pub use error::{Error, Result};
pub use server::DriverProcess;
pub use transport::{PipeTransport, Transport, TransportParts, TransportReceiver};
