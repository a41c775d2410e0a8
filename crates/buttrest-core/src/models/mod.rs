//! Shared data models for device clients

mod command;
mod device;
mod reading;

pub use command::*;
pub use device::*;
pub use reading::*;
