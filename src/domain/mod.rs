//! Domain module for the todo list.
//!
//! This module contains the todo entity and its value objects.

pub mod todo;

pub use todo::{InvalidTodoId, Timestamp, TimestampParseError, Todo, TodoId};
