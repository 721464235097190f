//! Stderr logging for the viewer crates and the CLI.
//!
//! Records from the `freeview*` crates carry a short component tag
//! (`core`, `gesture`, `anchor`, `session`, `app`) and follow the requested
//! level. Anything else, such as a dependency's own logging, only gets
//! through at `warn` and above.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};

const COMPONENTS: [(&str, &str); 5] = [
    ("freeview_core", "core"),
    ("freeview_gesture", "gesture"),
    ("freeview_anchor", "anchor"),
    ("freeview_session", "session"),
    ("freeview", "app"),
];

/// Component tag for a log target, `None` outside the viewer crates.
fn component(target: &str) -> Option<&'static str> {
    let krate = target.split("::").next().unwrap_or(target);
    COMPONENTS
        .iter()
        .find(|(name, _)| *name == krate)
        .map(|&(_, tag)| tag)
}

fn passes(level: Level, target: &str, max: LevelFilter) -> bool {
    if level > max {
        return false;
    }
    component(target).is_some() || level <= Level::Warn
}

fn format_line(elapsed: f64, level: Level, target: &str, args: &fmt::Arguments<'_>) -> String {
    let tag = component(target).unwrap_or("dep");
    format!("[{elapsed:8.3}s {level:<5} {tag:>7}] {args}")
}

struct ViewerLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for ViewerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        passes(metadata.level(), metadata.target(), self.level)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<ViewerLogger> = OnceLock::new();

/// Install the stderr logger at `level` for the viewer crates.
///
/// Only the first call installs anything; later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| ViewerLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// `EnvFilter` directives: `warn` globally, `level` for the viewer crates.
#[cfg(feature = "tracing")]
fn viewer_directives(level: LevelFilter) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = String::from("warn");
    for (krate, _) in COMPONENTS {
        directives.push_str(&format!(",{krate}={level}"));
    }
    directives
}

/// Install a `tracing` subscriber. `RUST_LOG` wins over `level` when set.
///
/// Text output closes each instrumented span with its duration, which is
/// what the `instrument` attributes on the entry points are for.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(viewer_directives(level)));
    let builder = tracing_fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(tracing_fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
