pub mod config;
pub mod error;
pub mod fields;
pub mod filter;
pub mod segment;
pub mod sync;

pub use config::AppConfig;
pub use error::{AudienceError, AudienceResult};
