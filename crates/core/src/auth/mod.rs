//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - Detection of hashes made under an older cost policy

mod password;

pub use password::{PasswordError, hash_password, needs_rehash, verify_password};
