//! Route handlers.

pub mod accounts;
pub mod graph;
pub mod health;
pub mod helper;
pub mod profile;
