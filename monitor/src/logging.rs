//! Log output for the monitor
//!
//! Every event is written twice: to stderr and appended to the log file,
//! both as `YYYY-MM-DD HH:MM:SS,mmm - LEVEL - message`.

use std::fmt;
use std::path::Path;

use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{MonitorError, Result};

/// `time - LEVEL - message` line format
#[derive(Debug, Clone, Copy, Default)]
pub struct MonitorLogFormat;

impl<S, N> FormatEvent<S, N> for MonitorLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let now = chrono::Local::now();
        write!(
            writer,
            "{} - {} - ",
            now.format("%Y-%m-%d %H:%M:%S,%3f"),
            level_name(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

pub fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Non-blocking writer appending to `path`. Keep the guard alive for as
/// long as events should reach the file.
pub fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| MonitorError::Logging(format!("{} is not a file path", path.display())))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(directory)
        .map_err(|e| MonitorError::Logging(e.to_string()))?;

    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber: console plus appended log file.
pub fn init(level: &str, log_file: &Path) -> Result<WorkerGuard> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let directive = |target: &str| {
        format!("{}={}", target, level)
            .parse::<Directive>()
            .map_err(|e| MonitorError::Logging(format!("invalid log directive: {}", e)))
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(directive("vmscale_monitor")?)
        .add_directive(directive("resource_monitor")?);

    let (file, guard) = file_writer(log_file)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(MonitorLogFormat)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(MonitorLogFormat)
                .with_ansi(false)
                .with_writer(file),
        )
        .try_init()
        .map_err(|e| MonitorError::Logging(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_line_format() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(MonitorLogFormat)
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Monitoring threshold set at 75%");
            tracing::warn!("THRESHOLD EXCEEDED");
        });

        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - INFO - Monitoring threshold set at 75%"));
        assert!(lines[1].ends_with(" - WARNING - THRESHOLD EXCEEDED"));

        // 2026-10-18 09:15:02,345
        let timestamp = lines[0].split(" - ").next().unwrap();
        assert_eq!(timestamp.len(), 23);
        assert_eq!(&timestamp[19..20], ",");
    }

    #[test]
    fn test_file_writer_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vm_monitor.log");
        std::fs::write(&path, "previous run\n").unwrap();

        let (file, guard) = file_writer(&path).unwrap();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(MonitorLogFormat)
                .with_ansi(false)
                .with_writer(file),
        );
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("Error in monitoring: boom");
        });
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("previous run\n"));
        assert!(contents.contains(" - ERROR - Error in monitoring: boom"));
    }

    #[test]
    fn test_level_names() {
        assert_eq!(level_name(&Level::WARN), "WARNING");
        assert_eq!(level_name(&Level::INFO), "INFO");
    }
}
