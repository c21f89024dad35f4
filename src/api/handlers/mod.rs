//! Route handlers for the Belezo identity service.

pub mod auth;
pub mod health;
pub mod root;
