//! Test doubles for driving a link without sockets.

mod scripted;

pub use scripted::ScriptedConnector;
