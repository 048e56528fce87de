//! API Routes

pub mod health;
