//! Process logging.
//!
//! The subscriber is built once by [`dispatch`] and either installed globally
//! with [`init`] at process start or scoped with
//! [`tracing::dispatcher::with_default`]. Nothing reconfigures it afterwards.

use std::io;

use tracing::dispatcher::SetGlobalDefaultError;
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::github::action::get_action_input;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Emit debug events.
    pub verbose: bool,
}

impl LoggingConfig {
    /// Debug logging is on when the runner is in debug mode or the action
    /// was started with the `verbose` input set to `true`.
    pub fn from_env() -> Self {
        let runner_debug = std::env::var("RUNNER_DEBUG")
            .map(|value| value == "1")
            .unwrap_or(false);
        let verbose = get_action_input("verbose").eq_ignore_ascii_case("true");
        Self {
            verbose: runner_debug || verbose,
        }
    }

    pub fn level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        }
    }
}

/// Builds the logging handle. `RUST_LOG` takes precedence over `config`.
pub fn dispatch<W>(config: LoggingConfig, writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.level().into()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish();
    Dispatch::new(subscriber)
}

/// Installs the stdout logger for the rest of the process. Fails if a global
/// subscriber is already set.
pub fn init(config: LoggingConfig) -> Result<(), SetGlobalDefaultError> {
    tracing::dispatcher::set_global_default(dispatch(config, io::stdout))
}
