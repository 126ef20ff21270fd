use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
#[cfg(feature = "clap")]
pub mod overrides;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use overrides::AnalysisOverrides;
pub use settings::{
    AnalysisSettings, Config, DiagnosticsSettings, LoggingSettings, ProviderSettings,
};

/// Environment variables with this prefix override file values,
/// e.g. `RATIOLENS__ANALYSIS__WINDOW=63`.
pub const ENV_PREFIX: &str = "RATIOLENS";

/// Loads the application configuration.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file
/// (`path`, or an optional `ratiolens.toml` in the working directory), then
/// `RATIOLENS__*` environment variables. The result is validated before it
/// is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("ratiolens").required(false),
    };

    let builder = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::BetaSource;
    use std::io::Write;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let file = write_toml(
            r#"
            [analysis]
            window = 63
            beta_source = "raw"

            [diagnostics]
            significance = 0.01
            "#,
        );

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.analysis.window, 63);
        assert_eq!(config.analysis.beta_source, BetaSource::Raw);
        assert_eq!(config.analysis.period, 252);
        assert_eq!(config.analysis.benchmark, "^JKSE");
        assert_eq!(config.diagnostics.significance, 0.01);
        assert_eq!(config.diagnostics.ljung_box_lags, 10);
        assert_eq!(config.provider, ProviderSettings::default());
    }

    #[test]
    fn invalid_window_is_rejected() {
        let file = write_toml("[analysis]\nwindow = 1\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn significance_outside_unit_interval_is_rejected() {
        let mut config = Config::default();
        config.diagnostics.significance = 1.5;
        assert!(config.validate().is_err());
    }
}
