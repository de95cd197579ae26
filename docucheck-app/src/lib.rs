pub mod bootstrap;
pub mod config;
pub mod error;
pub mod server;
pub mod stores;
pub mod telemetry;

pub use error::AppError;
