// Public API for integration tests and potential library usage

pub mod auth;
pub mod config;
pub mod otp;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod types;
pub mod ws;

// Re-export broadcast for testing
pub mod broadcast;
