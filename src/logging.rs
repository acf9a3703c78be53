/// Logging setup for applications embedding the store
///
/// The store itself only emits `tracing` events. Applications that have no
/// subscriber of their own can call `init` once at startup.

use tracing_subscriber::EnvFilter;

/// Verbosity of the store's own log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[default]
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Filter directive scoped to this crate
    pub fn directive(self) -> String {
        format!("habit_store={}", self.as_str())
    }
}

/// Install a stderr fmt subscriber
///
/// `RUST_LOG` takes precedence over `level` when it is set. Returns an error
/// if a global subscriber is already installed.
pub fn init(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Keep stdout free for the host application
        .try_init()
}
