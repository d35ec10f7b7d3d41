use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Filter used when `RUST_LOG` is not set.
fn default_directives(verbose: bool) -> &'static str {
    if verbose { "warn,fxconv=debug" } else { "off" }
}

/// Chooses filter directives: a non-blank `RUST_LOG` wins, otherwise the
/// verbosity flag decides.
fn filter_directives(verbose: bool, rust_log: Option<String>) -> String {
    rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_directives(verbose).to_string())
}

/// Installs the global subscriber. Output is off unless `verbose` or `RUST_LOG` is set.
///
/// Call after loading any `.env` file so a `RUST_LOG` defined there applies.
pub fn init_logging(verbose: bool) {
    let directives = filter_directives(verbose, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let env_filter = EnvFilter::builder().parse_lossy(directives);

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_rust_log_overrides_verbosity() {
        assert_eq!(
            filter_directives(false, Some("fxconv=trace".to_string())),
            "fxconv=trace"
        );
        assert_eq!(filter_directives(true, Some("  ".to_string())), "warn,fxconv=debug");
        assert_eq!(filter_directives(false, None), "off");
    }

    #[test]
    fn test_directives_read_from_env_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let env_file = temp_dir.path().join(".env");
        fs::write(&env_file, "FXCONV_LOG_TEST_DIRECTIVES=fxconv=info\n").unwrap();

        dotenvy::from_path(&env_file).unwrap();
        let directives =
            filter_directives(false, std::env::var("FXCONV_LOG_TEST_DIRECTIVES").ok());
        assert_eq!(directives, "fxconv=info");
    }
}
