use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_INPUT_PATH: &str = "user-wallet-transactions.json";
pub const DEFAULT_LOG_FILTER: &str = "credit_cli=info,credit_core=info";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// JSON file holding an array of transaction events
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Indent the JSON written to stdout
    pub pretty: bool,
    /// Emit full per-wallet reports instead of the bare score mapping
    pub detailed: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when RUST_LOG is unset
    pub filter: String,
}

impl AppConfig {
    /// Load configuration. `input_path` (from the command line) wins over
    /// every other source.
    pub fn load(input_path: Option<String>) -> Result<Self, ConfigError> {
        Self::load_with(input_path, Environment::with_prefix("CREDIT"))
    }

    fn load_with(input_path: Option<String>, env: Environment) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("input.path", DEFAULT_INPUT_PATH)?
            .set_default("output.pretty", true)?
            .set_default("output.detailed", false)?
            .set_default("log.filter", DEFAULT_LOG_FILTER)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // CREDIT__INPUT__PATH, CREDIT__OUTPUT__DETAILED, ...
            .add_source(env.separator("__").try_parsing(true))
            .set_override_option("input.path", input_path)?
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;

    /// An environment source that ignores the process environment.
    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("CREDIT").source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::load_with(None, env(&[])).unwrap();
        assert_eq!(config.input.path, DEFAULT_INPUT_PATH);
        assert!(config.output.pretty);
        assert!(!config.output.detailed);
        assert_eq!(config.log.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let config = AppConfig::load_with(
            None,
            env(&[
                ("CREDIT__OUTPUT__DETAILED", "true"),
                ("CREDIT__INPUT__PATH", "exports/env.json"),
            ]),
        )
        .unwrap();
        assert!(config.output.detailed);
        assert_eq!(config.input.path, "exports/env.json");
    }

    #[test]
    fn test_command_line_path_overrides() {
        let config = AppConfig::load_with(
            Some("exports/aave.json".to_string()),
            env(&[("CREDIT__INPUT__PATH", "exports/env.json")]),
        )
        .unwrap();
        assert_eq!(config.input.path, "exports/aave.json");
    }
}
