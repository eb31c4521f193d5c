//! Structured logging setup.
//!
//! The engine crates only emit `tracing` events. An embedding process calls
//! [`init_logging`] once at startup; tests install [`log_subscriber`] with
//! their own writer instead.
//!
//! Events go to stderr either as human-readable lines or as one JSON object
//! per line. `SC_LOG` (falling back to `RUST_LOG`) takes an `EnvFilter`
//! directive; `SC_LOG_FORMAT` selects `human` or `jsonl`.

use std::io::IsTerminal;

use serde::{Deserialize, Serialize};
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const LOG_ENV: &str = "SC_LOG";
const LOG_FORMAT_ENV: &str = "SC_LOG_FORMAT";

/// Crates whose events the default directive lets through.
const ENGINE_TARGETS: &[&str] = &["sc_common", "sc_shards", "sc_io"];

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event, fields flattened.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "human" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

/// Where and how engine events are rendered.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `sc_io=debug,sc_shards=info`.
    pub filter: String,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            filter: engine_directive(LevelFilter::INFO),
            ansi: false,
        }
    }
}

impl LogConfig {
    /// Engine crates at `level`, everything else off.
    pub fn at_level(format: LogFormat, level: LevelFilter) -> Self {
        LogConfig {
            format,
            filter: engine_directive(level),
            ansi: false,
        }
    }

    /// Read `SC_LOG` / `RUST_LOG` and `SC_LOG_FORMAT`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = LogConfig {
            ansi: std::io::stderr().is_terminal(),
            ..LogConfig::default()
        };
        if let Some(filter) = std::env::var(LOG_ENV)
            .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
            .ok()
            .filter(|f| EnvFilter::try_new(f).is_ok())
        {
            config.filter = filter;
        }
        if let Some(format) = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|f| f.parse().ok())
        {
            config.format = format;
        }
        config
    }
}

fn engine_directive(level: LevelFilter) -> String {
    ENGINE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Subscriber rendering events per `config` into `writer`.
pub fn log_subscriber<W>(config: &LogConfig, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(&config.filter)
        .unwrap_or_else(|_| EnvFilter::new(engine_directive(LevelFilter::INFO)));

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Human => fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .with_ansi(config.ansi)
            .with_filter(filter)
            .boxed(),
        LogFormat::Jsonl => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    };
    tracing_subscriber::registry().with(layer)
}

/// Install the global subscriber writing to stderr.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), TryInitError> {
    log_subscriber(config, std::io::stderr).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!(" Human ".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_engine_directive() {
        let config = LogConfig::at_level(LogFormat::Human, LevelFilter::DEBUG);
        assert_eq!(config.filter, "sc_common=debug,sc_shards=debug,sc_io=debug");
    }

    #[test]
    fn test_jsonl_events_are_flat_objects() {
        let captured = Captured::default();
        let sink = captured.clone();
        let config = LogConfig::at_level(LogFormat::Jsonl, LevelFilter::DEBUG);

        tracing::subscriber::with_default(log_subscriber(&config, move || sink.clone()), || {
            tracing::debug!(shard = 3, "Wrote shard");
        });

        let line = captured.text();
        let event: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(event["message"], "Wrote shard");
        assert_eq!(event["shard"], 3);
        assert_eq!(event["level"], "DEBUG");
    }

    #[test]
    fn test_filter_drops_lower_levels() {
        let captured = Captured::default();
        let sink = captured.clone();
        let config = LogConfig::at_level(LogFormat::Human, LevelFilter::WARN);

        tracing::subscriber::with_default(log_subscriber(&config, move || sink.clone()), || {
            tracing::info!("hidden");
            tracing::warn!(location = "mars-1", "Location not in region table");
        });

        let text = captured.text();
        assert!(!text.contains("hidden"));
        assert!(text.contains("Location not in region table"));
        assert!(text.contains("mars-1"));
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let config = LogConfig {
            filter: "sc_common=loud".to_string(),
            ..LogConfig::default()
        };
        let captured = Captured::default();
        let sink = captured.clone();
        tracing::subscriber::with_default(log_subscriber(&config, move || sink.clone()), || {
            tracing::info!("still logged");
        });
        assert!(captured.text().contains("still logged"));
    }
}
