//! Remote command dispatch
//!
//! Translates `(command, value)` pairs from remote peers into engine calls.
//! Unknown commands and values of the wrong shape are dropped with a debug
//! log; they are never errors surfaced to the peer.

use crate::engine::PlaybackEngine;
use crate::types::{Direction, PlayMode};
use serde::{Deserialize, Serialize};

/// Loosely typed command argument as sent by peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandValue {
    Number(f64),
    Text(String),
}

impl CommandValue {
    /// Numeric view; numeric strings are accepted
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
        .filter(|n: &f64| n.is_finite())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

/// Validated remote command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCommand {
    Mode(PlayMode),
    Next,
    Prev,
    Toggle,
    /// Absolute volume, clamped by the engine
    Volume(f64),
    /// Fraction of the track duration in [0, 1]
    Seek(f64),
}

impl RemoteCommand {
    /// Parse a wire command; `None` when unknown or malformed
    pub fn parse(command: &str, value: Option<&CommandValue>) -> Option<Self> {
        let parsed = match command {
            "mode" => value
                .and_then(CommandValue::as_str)
                .and_then(PlayMode::parse)
                .map(Self::Mode),
            "next" => Some(Self::Next),
            "prev" => Some(Self::Prev),
            "toggle" => Some(Self::Toggle),
            "volume" => value.and_then(CommandValue::as_f64).map(Self::Volume),
            "seek" => value.and_then(CommandValue::as_f64).map(Self::Seek),
            _ => None,
        };

        if parsed.is_none() {
            tracing::debug!("Dropping remote command {:?} ({:?})", command, value);
        }
        parsed
    }
}

/// Apply a remote command to the engine
pub fn dispatch(engine: &mut PlaybackEngine, command: RemoteCommand) {
    tracing::debug!("Remote command: {:?}", command);

    match command {
        RemoteCommand::Mode(mode) => engine.set_mode(mode),
        RemoteCommand::Next => engine.advance(Direction::Next),
        RemoteCommand::Prev => engine.advance(Direction::Previous),
        RemoteCommand::Toggle => engine.toggle(),
        RemoteCommand::Volume(volume) => engine.set_volume(volume),
        RemoteCommand::Seek(fraction) => engine.seek_fraction(fraction),
    }
}
