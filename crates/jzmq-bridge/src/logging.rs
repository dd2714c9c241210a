//! Logger setup for the loaded library.

use crate::config::LoggingConfig;

/// Installs `env_logger` as the `log` backend.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once, or after the host process installed its own logger, is
/// harmless.
pub fn init(config: &LoggingConfig) {
    let result = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.level.as_str()),
    )
    .try_init();

    match result {
        Ok(()) => log::debug!("logging initialized (default level {})", config.level),
        Err(_) => log::debug!("logger already installed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
    }
}
