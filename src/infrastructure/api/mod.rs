//! REST access to the AccuAim server.

pub mod client;

pub use client::ApiClient;
