// Library exports for integration tests
pub mod audit;
pub mod config;
pub mod error;
pub mod handlers;
pub mod session;
pub mod store;
