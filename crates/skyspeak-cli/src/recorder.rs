//! JSON-lines recorder for session facts.
//!
//! Each non-cosmetic [`GameEvent`] becomes one line:
//!
//! ```json
//! {"timestamp":"2025-01-01T12:00:00.000Z","event":{"type":"answer_scored",...}}
//! ```
//!
//! Sound cues are skipped. Write failures are logged and never reach the
//! session.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use skyspeak_core::{GameEvent, GameEventEmitter};
use tracing::warn;

use crate::error::CliError;

#[derive(Serialize)]
struct RecordLine<'a> {
    timestamp: String,
    event: &'a GameEvent,
}

#[derive(Clone)]
pub struct EventRecorder {
    path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl EventRecorder {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> Result<Self, CliError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, event: &GameEvent) -> std::io::Result<()> {
        let line = RecordLine {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event,
        };
        let json = serde_json::to_string(&line)?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::other("recorder lock poisoned"))?;
        writeln!(writer, "{json}")?;
        writer.flush()
    }
}

impl GameEventEmitter for EventRecorder {
    fn emit(&self, event: GameEvent) {
        if event.is_cosmetic() {
            return;
        }
        if let Err(e) = self.write_line(&event) {
            warn!(path = %self.path.display(), error = %e, event = event.name(), "Failed to record event");
        }
    }

    fn clone_box(&self) -> Box<dyn GameEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use skyspeak_core::{GamePhase, SoundCue, TerminalCondition, Verdict};

    use super::*;

    fn lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn records_facts_not_cues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let recorder = EventRecorder::open(&path).unwrap();

        recorder.emit(GameEvent::PhaseChanged {
            from: GamePhase::Instructions,
            to: GamePhase::Playing,
        });
        recorder.emit(GameEvent::sound(SoundCue::PowerUp));
        recorder.emit(GameEvent::AnswerScored {
            round: 1,
            word: "Altitude".into(),
            verdict: Verdict::Correct,
            pronunciation_score: Some(0.8),
        });

        let lines = lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"]["type"], "phase_changed");
        assert_eq!(lines[1]["event"]["type"], "answer_scored");
        assert_eq!(lines[1]["event"]["round"], 1);
        assert!(lines[1]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");

        EventRecorder::open(&path).unwrap().emit(GameEvent::GameStarted);
        let recorder = EventRecorder::open(&path).unwrap();
        recorder.clone_box().emit(GameEvent::SessionEnded {
            condition: TerminalCondition::Timeout,
            final_score: 3,
            final_altitude: 4_200,
            collision_count: 1,
            time_remaining: 0,
            elapsed_ms: 140_000,
        });

        let lines = lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["event"]["condition"], "timeout");
        assert_eq!(lines[1]["event"]["finalScore"], 3);
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EventRecorder::open(&dir.path().join("missing/dir/out.jsonl")).err().unwrap();
        assert_eq!(err.exit_code(), 74);
    }
}
