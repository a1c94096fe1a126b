//! Sound notifications: fire-and-forget events the game emits to its host.

use crate::SoundMode;
use std::fmt;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEvent {
    GameStart,
    LineClear,
    GameOver,
    /// Pause toggled.
    Click,
}

impl SoundEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::GameStart => "game-start",
            Self::LineClear => "line-clear",
            Self::GameOver => "game-over",
            Self::Click => "click",
        }
    }
}

impl fmt::Display for SoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receiver for sound events. Failures are reported but never change game state.
pub trait SoundSink: fmt::Debug {
    fn play(&mut self, event: SoundEvent) -> Result<(), SoundError>;
}

/// Drops every event.
#[derive(Debug, Default)]
pub struct SilentSink;

impl SoundSink for SilentSink {
    fn play(&mut self, _event: SoundEvent) -> Result<(), SoundError> {
        Ok(())
    }
}

/// Records events in the log instead of playing audio.
#[derive(Debug, Default)]
pub struct LogSink;

impl SoundSink for LogSink {
    fn play(&mut self, event: SoundEvent) -> Result<(), SoundError> {
        log::info!("playing sound: {event}");
        Ok(())
    }
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default)]
pub struct BellSink;

impl SoundSink for BellSink {
    fn play(&mut self, _event: SoundEvent) -> Result<(), SoundError> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

pub fn sink_for(mode: SoundMode) -> Box<dyn SoundSink> {
    match mode {
        SoundMode::Off => Box::new(SilentSink),
        SoundMode::Log => Box::new(LogSink),
        SoundMode::Bell => Box::new(BellSink),
    }
}
