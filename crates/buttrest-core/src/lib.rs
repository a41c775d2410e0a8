//! buttrest-core - Core traits and types for the buttrest device gateway
//!
//! This crate provides the abstractions that let different hardware-control
//! clients (an Intiface server over websocket, an in-memory simulation, ...)
//! sit behind the same REST API.

pub mod client;
pub mod error;
pub mod links;
pub mod mock;
pub mod models;

pub use client::DeviceClient;
pub use error::{ClientError, ClientResult};
pub use mock::MockClient;
pub use models::*;
