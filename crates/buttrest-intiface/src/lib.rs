//! buttrest-intiface - Intiface server client
//!
//! Speaks Buttplug protocol v3 over a websocket to an Intiface server and
//! exposes the server's devices through the [`buttrest_core::DeviceClient`]
//! trait.
//!
//! # Usage
//!
//! ```ignore
//! use buttrest_intiface::{IntifaceClient, IntifaceConfig};
//!
//! let client = IntifaceClient::new(IntifaceConfig::new("ws://127.0.0.1:12345", "buttrest"));
//! client.connect().await?;
//! ```

pub mod client;
pub mod error;
pub mod messages;

pub use client::{IntifaceClient, IntifaceConfig};
pub use error::IntifaceError;
