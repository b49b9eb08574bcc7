//! Operations shared by several commands.

pub mod context;
pub mod pipeline;
pub mod suggest;

pub use context::Context;
