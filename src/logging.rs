use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing_subscriber::fmt::MakeWriter;

use crate::config::Settings;

/// Tracing sink for the `log_file` setting.
///
/// The subscriber is installed before settings are resolved (so settings
/// loading can log), which means the file is attached afterwards. Events
/// written before `attach` are dropped. Clones share the same file.
#[derive(Clone, Default)]
pub struct SessionLog {
    file: Arc<Mutex<Option<File>>>,
}

impl SessionLog {
    /// Start appending to the log file named by `settings`, creating parent
    /// directories. Returns the path attached, or `None` if logging to a
    /// file is not configured.
    pub fn attach<'a>(&self, settings: &'a Settings) -> std::io::Result<Option<&'a Path>> {
        let Some(path) = settings.log_file.as_deref() else {
            return Ok(None);
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        *self.lock() = Some(file);
        Ok(Some(path))
    }

    pub fn is_attached(&self) -> bool {
        self.lock().is_some()
    }

    // A panic while holding the lock leaves the file usable.
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One event's worth of output.
pub struct SessionLogWriter<'a> {
    log: &'a SessionLog,
}

impl Write for SessionLogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.log.lock().as_mut() {
            Some(f) => f.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.log.lock().as_mut() {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for SessionLog {
    type Writer = SessionLogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SessionLogWriter { log: self }
    }
}
