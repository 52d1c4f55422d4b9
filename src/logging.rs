use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Initialise logging. With `debug` the level defaults to `debug` and can be
/// overridden via `RUST_LOG`; otherwise it is forced to `info`.
///
/// When `log_file` is given, output is written to that file instead of stderr.
/// Calling this after a subscriber has been installed does nothing.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let filter = env_filter(debug);

    let Some(path) = log_file else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        return;
    };

    match file_appender(&path) {
        Ok(appender) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(appender)
                .try_init();
        }
        Err(err) => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
            tracing::warn!(path = %path.display(), "log file unavailable, logging to stderr: {err:#}");
        }
    }
}

fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("open log file {}", path.display()))
}

fn env_filter(debug: bool) -> EnvFilter {
    // Without debug logging `RUST_LOG` is ignored so a stray variable in the
    // environment cannot turn on verbose output.
    if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(true)))
    } else {
        EnvFilter::new(default_level(false))
    }
}

fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::default_level;

    #[test]
    fn debug_flag_selects_level() {
        assert_eq!(default_level(true), "debug");
        assert_eq!(default_level(false), "info");
    }
}
