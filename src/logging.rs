//! Log sink construction.
//!
//! Nothing here installs itself at load time: callers build a
//! [`Dispatch`] and hand it to whatever needs to log (the pager takes one in
//! its constructor). `main` additionally makes it the global default so setup
//! code outside the pager lands in the same file.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

/// Filter from `RUST_LOG`, falling back to `info`.
pub fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Build a dispatcher that writes timestamped, level-tagged lines to `writer`.
pub fn dispatch_to<W>(writer: W, filter: EnvFilter) -> Dispatch
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let subscriber = tfmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .finish();
    Dispatch::new(subscriber)
}

/// Build a dispatcher that logs to `path`, truncating any previous run's log.
pub fn file_dispatch(path: &Path, filter: EnvFilter) -> io::Result<Dispatch> {
    let file = File::create(path)?;
    Ok(dispatch_to(Mutex::new(file), filter))
}

#[cfg(test)]
pub(crate) mod capture {
    //! In-memory log writer for asserting on log output.

    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    pub struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLog {
        type Writer = CapturedLog;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::capture::CapturedLog;
    use super::*;
    use tracing::{error, info};

    #[test]
    fn test_dispatch_writes_level_and_message() {
        let log = CapturedLog::default();
        let dispatch = dispatch_to(log.clone(), EnvFilter::new("info"));
        tracing::dispatcher::with_default(&dispatch, || {
            info!("Finished scraping page# {}", 1);
            error!("Timed out");
        });

        let out = log.contents();
        assert!(out.contains("INFO"));
        assert!(out.contains("Finished scraping page# 1"));
        assert!(out.contains("ERROR"));
    }

    #[test]
    fn test_file_dispatch_truncates_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        std::fs::write(&path, "stale line from last run\n").unwrap();

        let dispatch = file_dispatch(&path, EnvFilter::new("info")).unwrap();
        tracing::dispatcher::with_default(&dispatch, || info!("fresh"));

        let out = std::fs::read_to_string(&path).unwrap();
        assert!(!out.contains("stale line"));
        assert!(out.contains("fresh"));
    }
}
