//! Logging and tracing utilities

use crate::config::{process_env, string_from};
use std::str::FromStr;
use tracing::Subscriber;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable selecting the log output format
pub const LOG_FORMAT_ENV: &str = "RESEARCH_LOG_FORMAT";

/// Output format for the fmt layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl LogFormat {
    /// Read the format from `RESEARCH_LOG_FORMAT`, falling back to pretty output
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    /// [`from_env`](Self::from_env) against an arbitrary lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        string_from(lookup, LOG_FORMAT_ENV)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Build the subscriber without installing it
///
/// Events go to `writer`; [`init_tracing_with`] passes stderr so stdout
/// stays free for command output.
pub fn subscriber<W>(
    default_directive: &str,
    format: LogFormat,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(env_filter(default_directive));

    match format {
        LogFormat::Pretty => Box::new(registry.with(fmt::layer().with_writer(writer))),
        LogFormat::Json => Box::new(registry.with(fmt::layer().json().with_writer(writer))),
    }
}

/// Initialize tracing subscriber with default configuration
///
/// Honors `RUST_LOG` and `RESEARCH_LOG_FORMAT`.
pub fn init_tracing() {
    init_tracing_with("info", LogFormat::from_env());
}

/// Initialize tracing with an explicit default filter and format
///
/// `RUST_LOG` still takes precedence over `default_directive` when set.
/// Calling this twice is a no-op for the second call.
pub fn init_tracing_with(default_directive: &str, format: LogFormat) {
    if let Err(e) = subscriber(default_directive, format, std::io::stderr).try_init() {
        tracing::debug!("Tracing already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!("".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_log_format_from_lookup() {
        assert_eq!(
            LogFormat::from_lookup(lookup(&[(LOG_FORMAT_ENV, "json")])),
            LogFormat::Json
        );
        assert_eq!(
            LogFormat::from_lookup(lookup(&[(LOG_FORMAT_ENV, " Pretty ")])),
            LogFormat::Pretty
        );
        assert_eq!(
            LogFormat::from_lookup(lookup(&[(LOG_FORMAT_ENV, "xml")])),
            LogFormat::Pretty
        );
        assert_eq!(LogFormat::from_lookup(lookup(&[])), LogFormat::Pretty);
    }

    #[test]
    fn test_events_go_to_the_given_writer() {
        let captured = Captured::default();
        let subscriber = subscriber("info", LogFormat::Pretty, captured.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("runtime warm");
        });

        assert!(captured.contents().contains("runtime warm"));
    }

    #[test]
    fn test_json_format_emits_one_object_per_event() {
        let captured = Captured::default();
        let subscriber = subscriber("info", LogFormat::Json, captured.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(attempts = 3, "server up");
        });

        let output = captured.contents();
        let line = output.lines().next().unwrap();
        let event: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(event["level"], "INFO");
        assert_eq!(event["fields"]["message"], "server up");
        assert_eq!(event["fields"]["attempts"], 3);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_tracing_with("debug", LogFormat::Pretty);
        init_tracing_with("debug", LogFormat::Json);
    }
}
