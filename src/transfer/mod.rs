//! Transfer module
//!
//! Data-channel lifecycle (passive listener allocation and one-shot
//! accept) and the concurrent copy task that moves bytes between a
//! FileSystem stream and the data socket.

pub mod data_channel;
pub mod task;

pub use data_channel::DataChannel;
pub use task::{Cleanup, TransferHandle, spawn_transfer};
