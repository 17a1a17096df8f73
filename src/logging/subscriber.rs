//! Tracing subscriber setup: console formatter, run-log file layer, and initialisation.
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

use super::utils::{format_datetime, format_time, log_dir_candidates, run_log_name, strip_ansi};

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// A [`tracing_subscriber::Layer`] that appends every event to the run log
/// as `[HH:MM:SS] message`, ANSI codes stripped.
///
/// Always captures events at `DEBUG` level and above regardless of the
/// console verbosity setting.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
    path: PathBuf,
}

impl FileLayer {
    /// Create the run log in the first writable candidate directory and
    /// write a run header.
    ///
    /// Returns `None` if no candidate directory accepts the file.
    pub(super) fn new(started: &DateTime<Local>) -> Option<Self> {
        let name = run_log_name(started);
        log_dir_candidates()
            .into_iter()
            .find_map(|dir| Self::open_in(&dir, &name, started))
    }

    /// Create the run log inside `dir`.
    pub(super) fn open_in(dir: &Path, name: &str, started: &DateTime<Local>) -> Option<Self> {
        fs::create_dir_all(dir).ok()?;
        let path = dir.join(name);
        let version = option_env!("PROVISION_VERSION")
            .unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let header = format!(
            "==========================================\n\
             Provision {version} {}\n\
             ==========================================\n",
            format_datetime(started),
        );
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()?;
        file.write_all(header.as_bytes()).ok()?;
        Some(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Location of the log file.
    pub(super) fn path(&self) -> &Path {
        &self.path
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = strip_ansi(&extractor.message);
        let ts = format_time(&Local::now());

        let line = match (level, target) {
            (tracing::Level::INFO, "provision::stage") => format!("[{ts}] ==> {msg}"),
            (tracing::Level::INFO, "provision::dry_run") => format!("[{ts}] [dry run] {msg}"),
            (tracing::Level::ERROR, _) => format!("[{ts}] [error] {msg}"),
            (tracing::Level::WARN, _) => format!("[{ts}] [warn] {msg}"),
            (tracing::Level::DEBUG, _) => format!("[{ts}] [debug] {msg}"),
            _ => format!("[{ts}] {msg}"),
        };

        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits provision-style
/// console output.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = &extractor.message;

        match level {
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            tracing::Level::INFO if target == "provision::stage" => {
                writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
            }
            tracing::Level::INFO if target == "provision::dry_run" => {
                writeln!(writer, "  \x1b[33m[DRY RUN]\x1b[0m {msg}")
            }
            tracing::Level::INFO => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Sets up a console subscriber in the provision output style and a file
/// layer that writes all events (including `debug`) to the run log named
/// after `started`. Returns the run log path, or `None` when no log file
/// could be created; console output works either way.
///
/// Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool, started: &DateTime<Local>) -> Option<PathBuf> {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(make_writer)
        .with_filter(console_level);

    let file_layer = FileLayer::new(started);
    let path = file_layer.as_ref().map(|l| l.path().to_path_buf());
    let file_layer = file_layer.map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    path
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};

    fn layer_in(dir: &Path) -> FileLayer {
        let started = Local::now();
        FileLayer::open_in(dir, &run_log_name(&started), &started).expect("open run log")
    }

    #[test]
    fn file_layer_writes_header() {
        let tmp = tempfile::tempdir().unwrap();
        let layer = layer_in(tmp.path());
        let content = fs::read_to_string(layer.path()).unwrap();
        assert!(content.contains("Provision"));
        assert!(layer.path().starts_with(tmp.path()));
    }

    #[test]
    fn file_layer_formats_timestamped_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let layer = layer_in(tmp.path());
        let path = layer.path().to_path_buf();
        let subscriber =
            tracing_subscriber::registry().with(layer.with_filter(LevelFilter::DEBUG));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "provision::stage", "Install software");
            tracing::info!(target: "provision::dry_run", "would install: Git.Git");
            tracing::warn!("\x1b[33mslow mirror\x1b[0m");
            tracing::info!("plain");
        });
        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().skip(3).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with('['));
        assert_eq!(&lines[0][10..], " ==> Install software");
        assert!(lines[1].ends_with("[dry run] would install: Git.Git"));
        assert!(lines[2].ends_with("[warn] slow mirror"));
        assert!(lines[3].ends_with("] plain"));
    }

    #[test]
    fn open_in_unwritable_location_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        fs::write(&file, "").unwrap();
        let started = Local::now();
        assert!(FileLayer::open_in(&file, "x.log", &started).is_none());
    }
}
