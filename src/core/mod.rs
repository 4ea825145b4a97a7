//! Core domain logic for credential rotation and session integrity

pub mod auth;
pub mod config;
pub mod store;
