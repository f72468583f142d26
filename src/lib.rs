//! Todo Sync Library
//!
//! This library provides a todo list REST backend (record store plus resource
//! API) and the client-side state cache that mirrors the server list.

pub mod api;
pub mod client;
pub mod domain;
pub mod infrastructure;
