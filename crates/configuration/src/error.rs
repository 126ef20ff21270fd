use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML file, the environment overrides or their deserialization failed.
    #[error("Failed to read configuration sources: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid setting: {0}")]
    ValidationError(String),
}
