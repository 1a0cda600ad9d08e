use std::collections::HashMap;
use std::num::ParseIntError;

pub const ENV_PORT: &str = "APP_PORT";
pub const ENV_LOG_LEVEL: &str = "APP_LOG_LEVEL";
pub const ENV_ENVIRONMENT: &str = "APP_ENV";

pub const DEFAULT_ENVIRONMENT: &str = "local";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Source of environment variables.
pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Env for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// port to listen on, `0` unless a default port was requested
    pub port: u16,
    /// log level name, validated when a logger is built from it
    pub log_level: String,
    /// free-form deployment tag, e.g. `local` or `production`
    pub environment: String,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

type ConfigStep = Box<dyn FnOnce(&mut Config, &dyn Env) -> Result<(), ConfigError>>;

/// Collects configuration steps and applies them in the order they were added.
pub struct ConfigBuilder {
    env: Box<dyn Env>,
    steps: Vec<ConfigStep>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            env: Box::new(ProcessEnv),
            steps: Vec::new(),
        }
    }
}

impl ConfigBuilder {
    /// Resolve variables from `env` instead of the process environment.
    pub fn with_env(mut self, env: impl Env + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Use `port` unless `APP_PORT` holds a value, in which case that value
    /// must parse as a port number.
    pub fn with_default_port(self, port: u16) -> Self {
        self.with_option(move |config, env| {
            config.port = port;
            if let Some(raw) = non_empty(env.var(ENV_PORT)) {
                config.port = raw
                    .parse()
                    .map_err(|source| ConfigError::InvalidPort { value: raw, source })?;
            }
            Ok(())
        })
    }

    pub fn with_option<F>(mut self, step: F) -> Self
    where
        F: FnOnce(&mut Config, &dyn Env) -> Result<(), ConfigError> + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let env = self.env.as_ref();
        let mut config = Config {
            port: 0,
            log_level: non_empty(env.var(ENV_LOG_LEVEL))
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            environment: non_empty(env.var(ENV_ENVIRONMENT))
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
        };

        for step in self.steps {
            step(&mut config, env)?;
        }

        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid port in APP_PORT environment variable {value:?}: {source}")]
    InvalidPort { value: String, source: ParseIntError },
    #[error("{0}")]
    Custom(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_options_or_env() {
        let config = Config::builder().with_env(env(&[])).build().unwrap();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.environment, "local");
        assert_eq!(config.port, 0);
    }

    #[test]
    fn test_env_overrides_defaults_but_not_port() {
        let config = Config::builder()
            .with_env(env(&[
                ("APP_PORT", "9000"),
                ("APP_LOG_LEVEL", "debug"),
                ("APP_ENV", "production"),
            ]))
            .build()
            .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.environment, "production");
        // only the default port option consults APP_PORT
        assert_eq!(config.port, 0);
    }

    #[test]
    fn test_empty_env_values_fall_back() {
        let config = Config::builder()
            .with_env(env(&[("APP_LOG_LEVEL", ""), ("APP_ENV", "")]))
            .build()
            .unwrap();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.environment, "local");
    }

    #[test]
    fn test_default_port_without_env() {
        let config = Config::builder()
            .with_env(env(&[]))
            .with_default_port(8001)
            .build()
            .unwrap();

        assert_eq!(config.port, 8001);
    }

    #[test]
    fn test_env_port_wins_over_default() {
        let config = Config::builder()
            .with_env(env(&[("APP_PORT", "9876")]))
            .with_default_port(8001)
            .build()
            .unwrap();

        assert_eq!(config.port, 9876);
    }

    #[test]
    fn test_default_port_edge_cases() {
        let cases: &[(u16, Option<&str>, Option<u16>)] = &[
            (0, None, Some(0)),
            (65535, None, Some(65535)),
            (8080, Some(""), Some(8080)),
            (8080, Some("0"), Some(0)),
            (8080, Some("not-a-port"), None),
            (8080, Some("99999"), None),
            (8080, Some("-1"), None),
            (8080, Some(" 9000"), None),
            (8080, Some("9000abc"), None),
        ];

        for (default_port, env_port, expected) in cases {
            let vars = match env_port {
                Some(v) => env(&[("APP_PORT", *v)]),
                None => env(&[]),
            };
            let result = Config::builder()
                .with_env(vars)
                .with_default_port(*default_port)
                .build();

            match expected {
                Some(port) => assert_eq!(result.unwrap().port, *port, "APP_PORT={:?}", env_port),
                None => assert!(
                    matches!(result, Err(ConfigError::InvalidPort { .. })),
                    "APP_PORT={:?} should be rejected",
                    env_port
                ),
            }
        }
    }

    #[test]
    fn test_invalid_port_error_message() {
        let err = Config::builder()
            .with_env(env(&[("APP_PORT", "not-a-number")]))
            .with_default_port(8080)
            .build()
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("invalid port"));
        assert!(message.contains("not-a-number"));
    }

    #[test]
    fn test_options_apply_in_order() {
        let config = Config::builder()
            .with_env(env(&[]))
            .with_default_port(8888)
            .with_option(|c, _| {
                c.log_level = "trace".to_string();
                Ok(())
            })
            .with_option(|c, _| {
                c.environment = "staging".to_string();
                Ok(())
            })
            .with_option(|c, _| {
                c.environment.push_str("-eu");
                Ok(())
            })
            .build()
            .unwrap();

        assert_eq!(config.port, 8888);
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.environment, "staging-eu");
    }

    #[test]
    fn test_failing_option_aborts_construction() {
        let result = Config::builder()
            .with_env(env(&[]))
            .with_option(|_, _| Err(ConfigError::Custom("boom".to_string())))
            .with_option(|_, _| panic!("steps after a failure must not run"))
            .build();

        match result {
            Err(ConfigError::Custom(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_options_see_the_injected_env() {
        let config = Config::builder()
            .with_env(env(&[("REGION", "eu-west-1")]))
            .with_option(|c, env| {
                if let Some(region) = env.var("REGION") {
                    c.environment = format!("{}@{}", c.environment, region);
                }
                Ok(())
            })
            .build()
            .unwrap();

        assert_eq!(config.environment, "local@eu-west-1");
    }

    #[test]
    fn test_process_env_missing_var() {
        assert_eq!(ProcessEnv.var("SVC_COMMON_SURELY_UNSET_VARIABLE"), None);
    }
}
