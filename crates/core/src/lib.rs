//! Core business logic for aac-site.

pub mod services;

pub use services::*;
