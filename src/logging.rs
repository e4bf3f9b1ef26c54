//! Diagnostic logging
//!
//! Logs go to stderr through `tracing-subscriber`. User-facing progress is
//! reported through pipeline events, not here. `RUST_LOG` wins over `-v`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a `-v` count
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter_for(verbose: u8, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("stagehand={}", level_for_verbosity(verbose))))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbose: u8) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = filter_for(verbose, rust_log.as_deref());
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose >= 2),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(7), "trace");
    }

    #[test]
    fn rust_log_overrides_verbosity() {
        let filter = filter_for(0, Some("stagehand=trace"));
        assert_eq!(filter.to_string(), "stagehand=trace");
    }

    #[test]
    fn blank_or_invalid_rust_log_falls_back() {
        assert_eq!(filter_for(1, Some("  ")).to_string(), "stagehand=info");
        assert_eq!(filter_for(2, Some("stagehand=notalevel")).to_string(), "stagehand=debug");
    }
}
