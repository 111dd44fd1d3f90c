//! Logging setup.
//!
//! Logs go to stderr; stdout carries keyword output and reports.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the `verbose` default level.
pub fn init(verbose: bool, json_format: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr())),
            )
            .init();
    }
}

/// Install the subscriber from the `[logging]` section, with flag overrides.
pub fn init_from_config(config: &kwgen_core::Config, verbose_override: bool, json_override: bool) {
    let (verbose, json_format) = resolve(config, verbose_override, json_override);
    init(verbose, json_format);
}

fn resolve(config: &kwgen_core::Config, verbose: bool, json: bool) -> (bool, bool) {
    let level = config.logging.level.to_lowercase();
    (
        verbose || level == "debug" || level == "trace",
        json || config.logging.format.eq_ignore_ascii_case("json"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwgen_core::Config;

    #[test]
    fn test_defaults_are_info_and_pretty() {
        assert_eq!(resolve(&Config::default(), false, false), (false, false));
    }

    #[test]
    fn test_config_level_and_format() {
        let mut config = Config::default();
        config.logging.level = "DEBUG".to_string();
        config.logging.format = "json".to_string();
        assert_eq!(resolve(&config, false, false), (true, true));
    }

    #[test]
    fn test_flags_override_config() {
        assert_eq!(resolve(&Config::default(), true, true), (true, true));
    }
}
