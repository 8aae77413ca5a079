pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod events;
pub mod frame;
pub mod link;
pub mod logging;
pub mod packets;
pub mod session;

// Reexport everything so we can just use this crate for importing the internals.
pub use zvt_builder::*;
pub use zvt_derive::*;
