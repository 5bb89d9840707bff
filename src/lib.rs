pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod format;

pub use config::Config;
pub use error::{AppError, InputError};
