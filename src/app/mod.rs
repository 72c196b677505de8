//! Client state, the event hand-off, and the reference event consumer.

pub mod event;
pub mod handler;
pub mod state;
