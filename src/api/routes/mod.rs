//! API Routes
//!
//! Route handlers organized by functionality.

pub mod auth;
pub mod discover;
pub mod habits;
pub mod health;
pub mod me;
pub mod spa;
pub mod users;
