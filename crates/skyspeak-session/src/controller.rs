//! Session controller: the async actor around [`SessionMachine`].
//!
//! One task owns the machine. It multiplexes external commands, capture
//! events, ticks and scoring results (which both come back on an internal
//! channel), and the next timeline deadline into a single input stream, so
//! every state change happens on one logical thread. After each input the
//! latest [`SessionSnapshot`] is published on a `watch` channel.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use skyspeak_core::{
    CaptureDevice, CaptureEvent, GameEventEmitter, GameSettings, PronunciationScorer, SessionSnapshot,
    Vocabulary, validate_settings,
};
use skyspeak_voice::CaptureLifecycle;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::error::SessionError;
use crate::machine::{Command, Directive, Input, SessionMachine};
use crate::ticker::Tickers;

/// Everything needed to start a session besides its ports.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub settings: GameSettings,
    pub vocabulary: Vocabulary,
    /// Seed for word draws and projectile jitter. `None` seeds from entropy.
    pub seed: Option<u64>,
}

/// Handle to a running session controller.
///
/// Commands are fire-and-forget; observe their effect through
/// [`snapshot`](Self::snapshot), [`subscribe`](Self::subscribe) or the event
/// emitter the session was spawned with.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn start(&self) -> Result<(), SessionError> {
        self.send(Command::Start)
    }

    pub fn play(&self) -> Result<(), SessionError> {
        self.send(Command::Play)
    }

    pub fn restart(&self) -> Result<(), SessionError> {
        self.send(Command::Restart)
    }

    pub fn exit(&self) -> Result<(), SessionError> {
        self.send(Command::Exit)
    }

    pub fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::ControllerStopped)
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Close the command channel and wait for the controller to stop.
    ///
    /// A session that has not exited yet exits now.
    pub async fn join(self) -> Result<(), SessionError> {
        drop(self.commands);
        self.task
            .await
            .map_err(|e| SessionError::ControllerFailed(e.to_string()))
    }
}

/// Validate the settings and spawn a session controller on the current
/// runtime.
pub fn spawn_session(
    config: SessionConfig,
    device: Arc<dyn CaptureDevice>,
    scorer: Arc<dyn PronunciationScorer>,
    emitter: Arc<dyn GameEventEmitter>,
) -> Result<SessionHandle, SessionError> {
    validate_settings(&config.settings)?;

    let timing = &config.settings.timing;
    let physics_period = timing.physics_tick();
    let countdown_period = timing.countdown_tick();
    let (lifecycle, capture_events) = CaptureLifecycle::spawn(device, timing.capture_settle());
    let lifecycle = Arc::new(lifecycle);

    let rng = config
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let machine = SessionMachine::new(
        config.settings,
        config.vocabulary,
        rng,
        lifecycle.clone(),
        emitter,
    );

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (internal_tx, internal_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());

    let controller = Controller {
        machine,
        lifecycle,
        scorer,
        origin: Instant::now(),
        tickers: Tickers::new(),
        physics_period,
        countdown_period,
        scoring: None,
        internal_tx,
    };
    let task = tokio::spawn(controller.run(command_rx, capture_events, internal_rx, snapshot_tx));

    Ok(SessionHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
        task,
    })
}

struct Controller {
    machine: SessionMachine,
    lifecycle: Arc<CaptureLifecycle>,
    scorer: Arc<dyn PronunciationScorer>,
    origin: Instant,
    tickers: Tickers,
    physics_period: Duration,
    countdown_period: Duration,
    scoring: Option<AbortHandle>,
    internal_tx: mpsc::UnboundedSender<Input>,
}

impl Controller {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut capture_events: mpsc::UnboundedReceiver<CaptureEvent>,
        mut internal: mpsc::UnboundedReceiver<Input>,
        snapshots: watch::Sender<SessionSnapshot>,
    ) {
        info!("Session controller started");

        loop {
            let deadline = self.machine.next_due().map(|due| self.origin + due);

            let input = tokio::select! {
                biased;

                command = commands.recv() => {
                    command.map_or_else(
                        || {
                            debug!("All session handles dropped; exiting");
                            Input::Command(Command::Exit)
                        },
                        Input::Command,
                    )
                }
                Some(event) = capture_events.recv() => Input::Capture(event),
                Some(input) = internal.recv() => input,
                () = wait_until(deadline) => Input::TimelineDue,
            };

            let directives = self.machine.handle(input, self.origin.elapsed());
            snapshots.send_replace(self.machine.snapshot());

            if self.execute(directives) {
                break;
            }
        }

        self.shutdown().await;
    }

    /// Carry out directives. Returns `true` when the controller should stop.
    fn execute(&mut self, directives: Vec<Directive>) -> bool {
        let mut exit = false;
        for directive in directives {
            match directive {
                Directive::StartTickers { epoch } => self.tickers.start(
                    epoch,
                    self.physics_period,
                    self.countdown_period,
                    &self.internal_tx,
                ),
                Directive::StopTickers => self.tickers.stop(),
                Directive::Score {
                    epoch,
                    round,
                    word,
                    clip,
                } => {
                    self.abort_scoring();
                    let scorer = Arc::clone(&self.scorer);
                    let tx = self.internal_tx.clone();
                    let task = tokio::spawn(async move {
                        let result = scorer.score(&word, &clip).await;
                        // Controller gone means nobody is waiting for this result.
                        let _ = tx.send(Input::Scored {
                            epoch,
                            round,
                            result,
                        });
                    });
                    self.scoring = Some(task.abort_handle());
                }
                Directive::AbortScoring => self.abort_scoring(),
                Directive::Exit => exit = true,
            }
        }
        exit
    }

    fn abort_scoring(&mut self) {
        if let Some(task) = self.scoring.take() {
            if !task.is_finished() {
                debug!("Aborting in-flight scoring request");
            }
            task.abort();
        }
    }

    async fn shutdown(mut self) {
        self.tickers.stop();
        self.abort_scoring();
        self.lifecycle.shutdown().await;
        info!(
            final_score = self.machine.session().checkpoints,
            "Session controller stopped"
        );
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
