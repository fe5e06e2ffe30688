//! Logging infrastructure for Carebloom.
//!
//! Logs go to stderr; stdout is reserved for command output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose events pass the default filter
const OWN_TARGETS: &[&str] = &["carebloom_core", "carebloom"];

/// Initialize logging at INFO for Carebloom's own crates
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific level for Carebloom's own crates
///
/// Dependencies (the HTTP stack in particular) are held at WARN. A
/// `RUST_LOG` environment variable replaces the whole filter.
pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn default_filter(level: &str) -> EnvFilter {
    let directives = OWN_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::new(format!("warn,{}", directives))
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(default_filter("debug"))
        .try_init();
}
