use downlink_error::{RouteError, RouteResult};
use std::sync::{Arc, Mutex};
use tracing::{subscriber::set_global_default, Level};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::DynFilterFn, fmt, layer::SubscriberExt, Layer, Registry,
};

/// Logging bootstrap for binaries embedding the routing core.
///
/// Writes to stdout and a daily rolling file. The level can be changed
/// at runtime through the shared handle.
pub struct Logger {
    level: Arc<Mutex<Level>>,
    log_dir: String,
    _file_guard: Option<WorkerGuard>,
}

impl Logger {
    pub fn new(level: Option<Level>) -> Self {
        Logger {
            level: Arc::new(Mutex::new(level.unwrap_or(Level::INFO))),
            log_dir: "logs".to_string(),
            _file_guard: None,
        }
    }

    /// Override the rolling-file directory (defaults to `logs/`).
    pub fn with_log_dir(mut self, dir: impl Into<String>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Change the active level; takes effect on the next event.
    pub fn set_level(&self, new_level: Level) {
        let mut level = self.level.lock().unwrap();
        *level = new_level;
    }

    pub fn get_level(&self) -> Level {
        *self.level.lock().unwrap()
    }

    /// Install the global subscriber with console and file layers.
    ///
    /// Fails if a global subscriber is already set.
    pub fn initialize(&mut self) -> RouteResult<()> {
        let file_appender = rolling::daily(&self.log_dir, "downlink.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        self._file_guard = Some(guard);

        let console_filter = {
            let level = Arc::clone(&self.level);
            DynFilterFn::new(move |metadata, _| metadata.level() <= &*level.lock().unwrap())
        };
        let file_filter = {
            let level = Arc::clone(&self.level);
            DynFilterFn::new(move |metadata, _| metadata.level() <= &*level.lock().unwrap())
        };

        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_filter(console_filter);
        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_filter(file_filter);

        let subscriber = Registry::default().with(console_layer).with(file_layer);
        set_global_default(subscriber)
            .map_err(|_| RouteError::from("failed to set global logger"))?;
        Ok(())
    }
}
