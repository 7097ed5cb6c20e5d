//! API Routes
//!
//! Route handlers organized by functionality.

pub mod auth;
pub mod bills;
pub mod dashboard;
pub mod health;
pub mod power;
pub mod rooms;
