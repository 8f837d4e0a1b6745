//! Line-oriented activity recorders for swss, sairedis, and response-publisher traffic.
//!
//! Each [`Recorder`] appends timestamped lines to its own file and supports an
//! in-place reopen for external log rotation. Unlike the C++ original's global
//! `Recorder::Instance()` singleton, [`RecorderSet`] is an ordinary value an
//! `OrchDaemon` owns and threads through to whatever needs to record, so tests
//! can point it at a temp directory instead of sharing global state.

use chrono::Utc;
use log::{error, info};
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from recorder file operations.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("{name} recorder: failed to open {path}: {source}")]
    OpenFailed {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub const SWSS_FNAME: &str = "swss.rec";
pub const SAIREDIS_FNAME: &str = "sairedis.rec";
pub const RESPPUB_FNAME: &str = "responsepublisher.rec";
const DEFAULT_DIR: &str = ".";
const REC_START: &str = "recording started";

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// A single named recording stream (one of swss/sairedis/response-publisher).
pub struct Recorder {
    name: String,
    location: PathBuf,
    filename: String,
    recording: bool,
    rotate_pending: bool,
    file: Option<File>,
}

impl Recorder {
    fn new(name: impl Into<String>, filename: impl Into<String>, recording: bool) -> Self {
        Self {
            name: name.into(),
            location: PathBuf::from(DEFAULT_DIR),
            filename: filename.into(),
            recording,
            rotate_pending: false,
            file: None,
        }
    }

    /// Enables or disables recording.
    pub fn set_record(&mut self, record: bool) {
        self.recording = record;
    }

    /// Returns whether this recorder is currently active.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Points the recorder at a different directory; takes effect on the next [`start`](Self::start).
    pub fn set_location(&mut self, location: impl Into<PathBuf>) {
        self.location = location.into();
    }

    fn path(&self) -> PathBuf {
        self.location.join(&self.filename)
    }

    /// Opens the record file and writes the start-of-recording marker.
    ///
    /// No-op if recording is disabled.
    pub fn start(&mut self) -> Result<(), RecorderError> {
        if !self.recording {
            return Ok(());
        }

        let path = self.path();
        let mut file = open_append(&path).map_err(|source| RecorderError::OpenFailed {
            name: self.name.clone(),
            path: path.clone(),
            source,
        })?;
        let _ = writeln!(file, "{}|{}", timestamp(), REC_START);
        self.file = Some(file);
        info!("{} recorder: recording started at {}", self.name, path.display());
        Ok(())
    }

    /// Appends one timestamped line. No-op if recording is disabled or not started.
    pub fn record(&mut self, val: &str) {
        if !self.recording {
            return;
        }
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let _ = writeln!(file, "{}|{}", timestamp(), val);

        if self.rotate_pending {
            self.rotate_pending = false;
            self.reopen();
        }
    }

    /// Requests that the record file be closed and reopened on the next [`record`](Self::record) call.
    ///
    /// Assumes an external logrotate-style process has already moved the old file aside.
    pub fn request_rotate(&mut self) {
        self.rotate_pending = true;
    }

    fn reopen(&mut self) {
        self.file = None;
        let path = self.path();
        match open_append(&path) {
            Ok(file) => {
                self.file = Some(file);
                info!("{} recorder: log rotate handled", self.name);
            }
            Err(source) => {
                error!(
                    "{}",
                    RecorderError::OpenFailed {
                        name: self.name.clone(),
                        path,
                        source,
                    }
                );
            }
        }
    }
}

/// The three recording streams an orchestration daemon keeps, bundled for
/// convenience. Defaults mirror the original tool's factory defaults: swss
/// and sairedis traffic record by default, response-publisher traffic does not.
pub struct RecorderSet {
    pub swss: Recorder,
    pub sairedis: Recorder,
    pub respub: Recorder,
}

impl RecorderSet {
    /// Creates a new set with default on/off recording state, not yet started.
    pub fn new() -> Self {
        Self {
            swss: Recorder::new("SwSS", SWSS_FNAME, true),
            sairedis: Recorder::new("SaiRedis", SAIREDIS_FNAME, true),
            respub: Recorder::new("Response Publisher", RESPPUB_FNAME, false),
        }
    }

    /// Points every recorder at the same directory.
    pub fn set_location(&mut self, location: impl Into<PathBuf> + Clone) {
        self.swss.set_location(location.clone());
        self.sairedis.set_location(location.clone());
        self.respub.set_location(location);
    }

    /// Starts every recorder that is enabled.
    pub fn start_all(&mut self) -> Result<(), RecorderError> {
        self.swss.start()?;
        self.sairedis.start()?;
        self.respub.start()?;
        Ok(())
    }
}

impl Default for RecorderSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn disabled_recorder_never_opens_a_file() {
        let mut rec = Recorder::new("Test", "test.rec", false);
        rec.start().unwrap();
        rec.record("should not be written");
        assert!(rec.file.is_none());
    }

    #[test]
    fn enabled_recorder_writes_start_marker_and_lines() {
        let dir = tempdir().unwrap();
        let mut rec = Recorder::new("Test", "test.rec", true);
        rec.set_location(dir.path().to_path_buf());
        rec.start().unwrap();
        rec.record("hello");

        let contents = std::fs::read_to_string(dir.path().join("test.rec")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("recording started"));
        assert!(lines[1].ends_with("hello"));
    }

    #[test]
    fn rotate_reopens_the_same_path() {
        let dir = tempdir().unwrap();
        let mut rec = Recorder::new("Test", "test.rec", true);
        rec.set_location(dir.path().to_path_buf());
        rec.start().unwrap();
        rec.record("before rotate");
        rec.request_rotate();
        rec.record("after rotate");

        let contents = std::fs::read_to_string(dir.path().join("test.rec")).unwrap();
        assert!(contents.contains("before rotate"));
        assert!(contents.contains("after rotate"));
    }

    #[test]
    fn recorder_set_defaults_match_swss_and_respub_conventions() {
        let set = RecorderSet::new();
        assert!(set.swss.is_recording());
        assert!(set.sairedis.is_recording());
        assert!(!set.respub.is_recording());
    }
}
