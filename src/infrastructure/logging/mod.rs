// Logging module - Logging infrastructure
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::io;

/// Filter directive for a plain level name such as `info` or `debug`
pub fn default_directive(level: &str) -> String {
    format!("huber={},warn", level)
}

/// Initialize logging system.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(level)))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true)
                .with_file(false)
                .with_line_number(false)
        )
        .try_init()?;

    tracing::debug!("Huber logging system initialized");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive("debug"), "huber=debug,warn");
    }

    #[test]
    fn test_logging_init() {
        // Only one global subscriber per process; the second call must fail cleanly
        let _ = init_logging("info");
        assert!(init_logging("info").is_err());
    }
}
