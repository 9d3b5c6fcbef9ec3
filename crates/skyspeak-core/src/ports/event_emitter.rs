//! Event emitter trait for session facts and cues.
//!
//! Implementations handle transport details (channels, files, analytics
//! backends). The session only ever writes; nothing read back influences play.

use tokio::sync::mpsc;

use crate::events::GameEvent;

/// Trait for emitting game events.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts that don't need events
/// - `ChannelEmitter` - Forwards to an unbounded channel
/// - Adapter-specific implementations (JSON-lines recorder in the CLI)
#[cfg_attr(test, mockall::automock)]
pub trait GameEventEmitter: Send + Sync {
    /// Emit a game event.
    ///
    /// This method should not block.
    fn emit(&self, event: GameEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn GameEventEmitter>;
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl GameEventEmitter for NoopEmitter {
    fn emit(&self, _event: GameEvent) {}

    fn clone_box(&self) -> Box<dyn GameEventEmitter> {
        Box::new(self.clone())
    }
}

/// Forwards every event into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<GameEvent>,
}

impl ChannelEmitter {
    /// Create an emitter and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl GameEventEmitter for ChannelEmitter {
    fn emit(&self, event: GameEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Game event receiver dropped");
        }
    }

    fn clone_box(&self) -> Box<dyn GameEventEmitter> {
        Box::new(self.clone())
    }
}

/// Fans one event out to several emitters.
pub struct FanoutEmitter {
    targets: Vec<Box<dyn GameEventEmitter>>,
}

impl FanoutEmitter {
    pub fn new(targets: Vec<Box<dyn GameEventEmitter>>) -> Self {
        Self { targets }
    }
}

impl GameEventEmitter for FanoutEmitter {
    fn emit(&self, event: GameEvent) {
        for target in &self.targets {
            target.emit(event.clone());
        }
    }

    fn clone_box(&self) -> Box<dyn GameEventEmitter> {
        Box::new(Self {
            targets: self.targets.iter().map(|t| t.clone_box()).collect(),
        })
    }
}
