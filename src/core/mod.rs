//! Core library components.
//!
//! This module contains the reusable logic for fetching secrets, staging
//! them, and rendering templates. Nothing here writes to the terminal.

pub mod assignments;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod secrets;
pub mod store;
pub mod template;
pub mod types;
pub mod validation;
