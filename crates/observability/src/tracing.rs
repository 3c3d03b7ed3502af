//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable, for local shells.
    Pretty,
}

impl LogFormat {
    /// `GATEHOUSE_LOG_FORMAT` (`json` or `pretty`); JSON when unset or unknown.
    pub fn from_env() -> Self {
        std::env::var("GATEHOUSE_LOG_FORMAT")
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Self::Pretty,
            _ => Self::Json,
        }
    }
}

/// `RUST_LOG` when set and valid, otherwise `info`.
pub fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing using `GATEHOUSE_LOG_FORMAT` and `RUST_LOG`.
pub fn init() {
    init_with(LogFormat::from_env());
}

/// Install the global subscriber. Returns `false` when one was already set.
pub fn init_with(format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let installed = match format {
        LogFormat::Json => builder.json().with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    if installed.is_err() {
        return false;
    }
    tracing::debug!(?format, "tracing initialized");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats_leniently() {
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(" TEXT "), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
    }

    #[test]
    fn second_init_is_a_noop() {
        init_with(LogFormat::Json);
        assert!(!init_with(LogFormat::Pretty));
        tracing::info!("still logging");
    }
}
