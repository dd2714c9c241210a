//! Bridge configuration.
//!
//! Loads the names the bridge binds to on the managed side, plus the log
//! level, from an optional TOML file. The path comes from the
//! `JZMQ_BRIDGE_CONFIG` environment variable; without it, or when the file
//! does not exist, the defaults match the stock `org.zeromq` classes.

use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "JZMQ_BRIDGE_CONFIG";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Managed-side names the bridge resolves by reflection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Internal name of the context class
    #[serde(default = "default_context_class")]
    pub context_class: String,

    /// `long` field holding the native context pointer
    #[serde(default = "default_handle_field")]
    pub handle_field: String,

    /// Exception thrown for native failures, constructed as `(String, int)`
    #[serde(default = "default_exception_class")]
    pub exception_class: String,

    /// Class translating error numbers into managed objects
    #[serde(default = "default_error_class")]
    pub error_class: String,

    /// Static lookup method on `error_class`
    #[serde(default = "default_translator_method")]
    pub translator_method: String,

    #[serde(default = "default_translator_signature")]
    pub translator_signature: String,

    /// Callback method invoked on error handler targets
    #[serde(default = "default_report_method")]
    pub report_method: String,

    #[serde(default = "default_report_signature")]
    pub report_signature: String,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub bindings: BindingConfig,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_context_class() -> String {
    "org/zeromq/ZMQ$Context".to_string()
}

fn default_handle_field() -> String {
    "contextHandle".to_string()
}

fn default_exception_class() -> String {
    "org/zeromq/ZMQException".to_string()
}

fn default_error_class() -> String {
    "org/zeromq/ZMQ$Error".to_string()
}

fn default_translator_method() -> String {
    "findByCode".to_string()
}

fn default_translator_signature() -> String {
    "(I)Lorg/zeromq/ZMQ$Error;".to_string()
}

fn default_report_method() -> String {
    "reportError".to_string()
}

fn default_report_signature() -> String {
    "(Lorg/zeromq/ZMQ$Error;Ljava/lang/String;)I".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            context_class: default_context_class(),
            handle_field: default_handle_field(),
            exception_class: default_exception_class(),
            error_class: default_error_class(),
            translator_method: default_translator_method(),
            translator_signature: default_translator_signature(),
            report_method: default_report_method(),
            report_signature: default_report_signature(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();

        let config: Self = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                BridgeError::config(format!(
                    "failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("config file {} not found, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                return Err(BridgeError::config(format!(
                    "failed to read config file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `JZMQ_BRIDGE_CONFIG`, or defaults
    pub fn load() -> BridgeResult<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_or_default(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> BridgeResult<()> {
        let b = &self.bindings;
        let names = [
            ("context_class", &b.context_class),
            ("handle_field", &b.handle_field),
            ("exception_class", &b.exception_class),
            ("error_class", &b.error_class),
            ("translator_method", &b.translator_method),
            ("report_method", &b.report_method),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(BridgeError::config(format!("{} must not be empty", key)));
            }
        }

        for (key, value) in [
            ("translator_signature", &b.translator_signature),
            ("report_signature", &b.report_signature),
        ] {
            if !is_method_signature(value) {
                return Err(BridgeError::config(format!(
                    "{} is not a JNI method signature: {}",
                    key, value
                )));
            }
        }

        Ok(())
    }
}

/// Checks the outer shape of a JNI method descriptor: `(args)ret`.
fn is_method_signature(sig: &str) -> bool {
    match sig.strip_prefix('(').and_then(|rest| rest.split_once(')')) {
        Some((_, ret)) => !ret.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_bindings() {
        let config = BridgeConfig::default();
        assert_eq!(config.bindings.context_class, "org/zeromq/ZMQ$Context");
        assert_eq!(config.bindings.handle_field, "contextHandle");
        assert_eq!(config.bindings.report_method, "reportError");
        assert_eq!(
            config.bindings.report_signature,
            "(Lorg/zeromq/ZMQ$Error;Ljava/lang/String;)I"
        );
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(BridgeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_name() {
        let mut config = BridgeConfig::default();
        config.bindings.handle_field = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_signature() {
        let mut config = BridgeConfig::default();
        config.bindings.report_signature = "reportError".to_string();
        assert!(config.validate().is_err());

        config.bindings.report_signature = "(I)".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[logging]
level = "debug"

[bindings]
handle_field = "nativeHandle"
"#;
        let config: BridgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.bindings.handle_field, "nativeHandle");
        // Unspecified values should use defaults
        assert_eq!(config.bindings.error_class, "org/zeromq/ZMQ$Error");
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = BridgeConfig::load_or_default("/nonexistent/jzmq.toml").unwrap();
        assert_eq!(config.bindings.handle_field, "contextHandle");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bindings]\nreport_signature = \"nope\"").unwrap();

        let err = BridgeConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, BridgeError::Config { .. }));
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bindings").unwrap();

        assert!(BridgeConfig::load_or_default(file.path()).is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"trace\"").unwrap();

        env::set_var(CONFIG_ENV, file.path());
        let config = BridgeConfig::load();
        env::remove_var(CONFIG_ENV);

        assert_eq!(config.unwrap().logging.level, "trace");
    }

    #[test]
    #[serial]
    fn test_load_without_env_uses_defaults() {
        env::remove_var(CONFIG_ENV);
        let config = BridgeConfig::load().unwrap();
        assert_eq!(config.logging.level, "warn");
    }
}
