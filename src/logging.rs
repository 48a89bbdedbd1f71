// Logging setup: `tracing` events go to stderr and, when configured, are
// appended to a log file as well.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
///
/// A log file that cannot be opened is reported on stderr; logging then
/// carries on without it.
pub fn init(level: &str, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = log_file.and_then(|path| match open_log_file(path) {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .boxed(),
        ),
        Err(e) => {
            eprintln!(
                "{}: could not open log file {}: {e}",
                crate::config::APP_NAME,
                path.display()
            );
            None
        }
    });

    // A second call (config reload after a load failure, tests) finds a
    // subscriber already installed and keeps it.
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .try_init()
        .ok();
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_and_parent_dir_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("magnet2qb.log");

        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn init_tolerates_a_bad_log_path_and_repeated_calls() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        // Parent is a regular file, so the log file cannot be created.
        init("debug", Some(&blocker.join("x.log")));
        init("not a level ((", None);
    }
}
