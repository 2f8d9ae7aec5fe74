//! Core business logic for Pagedesk.
//!
//! This crate contains pure logic with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `auth` - Password hashing
//! - `threading` - The time-windowed policy that groups inbound messages into conversations
//! - `webhook` - Normalization and signature checks for Messenger webhook deliveries

pub mod auth;
pub mod threading;
pub mod webhook;
