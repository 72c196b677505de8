//! IRC protocol layer: connection lifecycle, line framing and parsing,
//! inbound dispatch, and the user input path.

pub mod commands;
pub mod connection;
pub mod dispatch;
pub mod framing;
pub mod manager;
pub mod message;
pub mod reader;
