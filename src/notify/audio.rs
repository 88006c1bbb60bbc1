//! Audio cues for urgent notifications.

use std::io::Write;

use thiserror::Error;

/// A short synthesized sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Two-tone alarm for urgent notifications.
    Alarm,
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    #[error("audio playback not permitted")]
    PermissionDenied,
}

/// Something that can play a cue. Failures are reported, never raised to
/// the operator.
pub trait AudioCue {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError>;
}

/// Plays nothing.
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioCue for SilentAudio {
    fn play(&mut self, _cue: Cue) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError> {
        let pulses: &[u8] = match cue {
            Cue::Alarm => b"\x07\x07",
        };
        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all(pulses)
            .and_then(|_| stderr.flush())
            .map_err(|e| AudioError::Unavailable(e.to_string()))
    }
}
