//! Keymint - Credential rotation and session integrity service
//!
//! Issues short-lived signed access tokens backed by single-use server-side
//! renewal credentials. Replayed credentials trip a cascade that revokes
//! every session of the affected user.

pub mod core;
