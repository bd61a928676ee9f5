//! Logging setup: env_logger backend, routed through indicatif on a TTY

use std::io::Write;

use indicatif::MultiProgress;

/// Default filter for the given verbosity flags; `RUST_LOG` still wins.
pub fn default_filter(quiet: bool, debug: bool) -> &'static str {
    if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Padded label and ANSI color for a log level
fn level_style(level: log::Level) -> (&'static str, &'static str) {
    match level {
        log::Level::Error => ("ERROR", "\x1b[31m"),
        log::Level::Warn => ("WARN ", "\x1b[33m"),
        log::Level::Info => ("INFO ", "\x1b[32m"),
        log::Level::Debug => ("DEBUG", "\x1b[36m"),
        log::Level::Trace => ("TRACE", "\x1b[35m"),
    }
}

fn format_line(record: &log::Record, color: bool) -> String {
    let (label, ansi) = level_style(record.level());
    let label = if color {
        format!("{ansi}{label}\x1b[0m")
    } else {
        label.to_string()
    };
    // Debug and below carry the emitting module
    if record.level() >= log::Level::Debug {
        let target = record.target().rsplit("::").next().unwrap_or_default();
        format!("[{label}] {target}: {}", record.args())
    } else {
        format!("[{label}] {}", record.args())
    }
}

/// Logger that prints through indicatif MultiProgress so lines never tear progress bars.
pub struct IndicatifLogger {
    inner: env_logger::Logger,
    multi: MultiProgress,
}

impl IndicatifLogger {
    pub fn new(inner: env_logger::Logger, multi: MultiProgress) -> Self {
        Self { inner, multi }
    }
}

impl log::Log for IndicatifLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.matches(record) {
            let line = format_line(record, true);
            self.multi.suspend(|| eprintln!("{line}"));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initialize logging.
///
/// With `multi` (TTY mode) lines go through [`IndicatifLogger`] in color;
/// otherwise plain `[LEVEL] message` lines suitable for log capture.
pub fn init_logging(quiet: bool, debug: bool, multi: Option<&MultiProgress>) {
    let env = env_logger::Env::default().default_filter_or(default_filter(quiet, debug));

    if let Some(multi) = multi {
        let logger = env_logger::Builder::from_env(env).build();
        let max_level = logger.filter();
        if log::set_boxed_logger(Box::new(IndicatifLogger::new(logger, multi.clone()))).is_ok() {
            log::set_max_level(max_level);
        }
    } else {
        let _ = env_logger::Builder::from_env(env)
            .format(|buf, record| writeln!(buf, "{}", format_line(record, false)))
            .try_init();
    }
}
