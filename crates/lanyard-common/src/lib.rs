pub mod errors;

pub use errors::{ConfigError, ConnectionError, LanyardError};

pub type Result<T> = std::result::Result<T, LanyardError>;
