pub mod config;
pub mod domain;
pub mod errors;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::customer::{Customer, CustomerId, CustomerPatch};
pub use errors::{ApplicationError, DomainError, InterfaceError};
