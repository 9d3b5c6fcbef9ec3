//! Session state machine.
//!
//! [`SessionMachine`] is the only writer of session state. It is a plain
//! struct: every input is handled to completion by [`SessionMachine::handle`]
//! at a logical time `now`, and whatever needs the runtime (tickers, scoring
//! requests, shutting down) comes back as a list of [`Directive`]s for the
//! controller to carry out. Capture start/stop and event emission are
//! synchronous calls on the injected ports, so a terminal latch has already
//! ended capture when `handle` returns.
//!
//! # Phases
//!
//! ```text
//! Start ──start──▶ Instructions ──play──▶ Playing ──terminal──▶ GameOver | Win
//!   ▲                                        │                      │
//!   └────────────────restart─────────────────┴──────────restart─────┘
//! ```
//!
//! Entering and leaving Playing each bump the epoch. Ticks and timeline
//! entries carry the epoch they were created in and are dropped once it is
//! stale.

mod resolver;

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use skyspeak_core::{
    AudioClip, CaptureEvent, CaptureHandle, GameEvent, GameEventEmitter, GamePhase,
    GameSettings, Projectile, RoundStage, ScoringError, ScoringResult, Session, SessionSnapshot,
    SoundCue, TerminalCondition, VisualEffects, Vocabulary, Word, player_y_for,
};
use tracing::{debug, info, warn};

use crate::capture::CaptureControl;
use crate::physics;
use crate::timeline::{PendingEffect, Step, Timeline};

/// External requests to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Leave the start screen.
    Start,
    /// Begin a match from the instructions screen.
    Play,
    /// Back to the start screen from a finished (or running) match.
    Restart,
    /// Leave the game entirely.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Physics,
    Countdown,
}

/// Everything the machine reacts to.
#[derive(Debug)]
pub enum Input {
    Command(Command),
    Capture(CaptureEvent),
    Tick {
        kind: TickKind,
        epoch: u64,
    },
    Scored {
        epoch: u64,
        round: u64,
        result: Result<ScoringResult, ScoringError>,
    },
    /// The earliest timeline entry may be due.
    TimelineDue,
}

/// Work the controller performs on the machine's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    StartTickers { epoch: u64 },
    StopTickers,
    /// Dispatch a scoring request; its result comes back as [`Input::Scored`].
    Score {
        epoch: u64,
        round: u64,
        word: Word,
        clip: AudioClip,
    },
    /// Abort the in-flight scoring request.
    AbortScoring,
    /// Stop the controller.
    Exit,
}

pub struct SessionMachine {
    settings: GameSettings,
    vocabulary: Vocabulary,
    rng: StdRng,
    capture: Arc<dyn CaptureControl>,
    emitter: Arc<dyn GameEventEmitter>,

    session: Session,
    epoch: u64,
    round: u64,
    stage: RoundStage,
    current_capture: Option<CaptureHandle>,
    listening: bool,
    scoring: bool,
    rotation: f32,
    projectiles: Vec<Projectile>,
    next_entity: u64,
    effects: VisualEffects,
    terminal: Option<TerminalCondition>,
    timeline: Timeline,
    match_started: Duration,
    exited: bool,

    directives: Vec<Directive>,
}

impl SessionMachine {
    pub fn new(
        settings: GameSettings,
        vocabulary: Vocabulary,
        rng: StdRng,
        capture: Arc<dyn CaptureControl>,
        emitter: Arc<dyn GameEventEmitter>,
    ) -> Self {
        let session = Session::new(
            settings.initial_altitude,
            settings.time_limit_secs,
            vocabulary.first().clone(),
        );
        Self {
            settings,
            vocabulary,
            rng,
            capture,
            emitter,
            session,
            epoch: 0,
            round: 0,
            stage: RoundStage::AwaitingAnswer,
            current_capture: None,
            listening: false,
            scoring: false,
            rotation: 0.0,
            projectiles: Vec::new(),
            next_entity: 0,
            effects: VisualEffects::default(),
            terminal: None,
            timeline: Timeline::new(),
            match_started: Duration::ZERO,
            exited: false,
            directives: Vec::new(),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub const fn phase(&self) -> GamePhase {
        self.session.phase
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    pub const fn round(&self) -> u64 {
        self.round
    }

    pub const fn stage(&self) -> RoundStage {
        self.stage
    }

    pub const fn terminal(&self) -> Option<TerminalCondition> {
        self.terminal
    }

    pub const fn effects(&self) -> VisualEffects {
        self.effects
    }

    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub const fn current_capture(&self) -> Option<CaptureHandle> {
        self.current_capture
    }

    pub const fn is_exited(&self) -> bool {
        self.exited
    }

    /// When the next timeline entry is due.
    pub fn next_due(&self) -> Option<Duration> {
        self.timeline.next_due()
    }

    pub fn pending_effects(&self) -> impl Iterator<Item = &PendingEffect> {
        self.timeline.iter()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session.clone(),
            round: self.round,
            round_stage: self.stage,
            player_y: player_y_for(self.session.altitude, self.settings.initial_altitude),
            rotation: self.rotation,
            projectiles: self.projectiles.clone(),
            effects: self.effects,
            listening: self.listening,
            terminal: self.terminal,
        }
    }

    // ── Dispatch ───────────────────────────────────────────────────

    /// Handle one input at logical time `now` (time since the controller
    /// started) and return the resulting directives.
    pub fn handle(&mut self, input: Input, now: Duration) -> Vec<Directive> {
        if self.exited {
            debug!(?input, "Session exited; ignoring input");
            return Vec::new();
        }

        match input {
            Input::Command(command) => self.on_command(command, now),
            Input::Capture(event) => self.on_capture(event, now),
            Input::Tick { kind, epoch } => self.on_tick(kind, epoch, now),
            Input::Scored {
                epoch,
                round,
                result,
            } => self.on_scored(epoch, round, result, now),
            Input::TimelineDue => self.run_due(now),
        }

        std::mem::take(&mut self.directives)
    }

    // ── Commands ───────────────────────────────────────────────────

    fn on_command(&mut self, command: Command, now: Duration) {
        match (command, self.session.phase) {
            (Command::Start, GamePhase::Start) => {
                self.set_phase(GamePhase::Instructions);
                self.emit(GameEvent::GameStarted);
            }
            (Command::Play, GamePhase::Instructions) => self.enter_playing(now),
            (Command::Restart, GamePhase::GameOver | GamePhase::Win) => self.reset_to_start(),
            (Command::Restart, GamePhase::Playing) => {
                self.leave_playing();
                self.reset_to_start();
            }
            (Command::Exit, phase) => {
                if phase == GamePhase::Playing {
                    self.leave_playing();
                }
                self.emit(GameEvent::Exited {
                    final_score: self.session.checkpoints,
                });
                info!(final_score = self.session.checkpoints, "Session exited");
                self.exited = true;
                self.directives.push(Directive::Exit);
            }
            (command, phase) => {
                debug!(?command, ?phase, "Ignoring invalid transition");
            }
        }
    }

    fn enter_playing(&mut self, now: Duration) {
        self.timeline.cancel_all();
        self.epoch += 1;

        let word = self.vocabulary.draw(&mut self.rng);
        self.session.altitude = self.settings.initial_altitude;
        self.session.time_remaining = self.settings.time_limit_secs;
        self.session.checkpoints = 0;
        self.session.collision_count = 0;
        self.session.current_word = word;

        self.round = 1;
        self.stage = RoundStage::AwaitingAnswer;
        self.current_capture = None;
        self.listening = false;
        self.scoring = false;
        self.rotation = 0.0;
        self.projectiles.clear();
        self.effects = VisualEffects::default();
        self.terminal = None;
        self.match_started = now;

        self.set_phase(GamePhase::Playing);
        self.emit(GameEvent::GameplayStarted {
            initial_altitude: self.settings.initial_altitude,
            time_limit: self.settings.time_limit_secs,
        });
        self.prompt_word();

        self.directives.push(Directive::StartTickers { epoch: self.epoch });
        self.schedule(now, self.settings.timing.warmup_ms, Step::Warmup);
    }

    /// External exit from Playing: everything running for the match stops.
    ///
    /// During a finale the latch has already stopped the match; only the
    /// pending finale is dropped.
    fn leave_playing(&mut self) {
        if self.terminal.is_some() {
            self.timeline.cancel_all();
        } else {
            self.stop_match_activity();
            self.emit(GameEvent::sound(SoundCue::BackgroundStop));
        }
        self.epoch += 1;
    }

    fn reset_to_start(&mut self) {
        self.session.altitude = self.settings.initial_altitude;
        self.session.time_remaining = self.settings.time_limit_secs;
        self.session.checkpoints = 0;
        self.session.collision_count = 0;
        self.round = 0;
        self.stage = RoundStage::AwaitingAnswer;
        self.rotation = 0.0;
        self.projectiles.clear();
        self.effects = VisualEffects::default();
        self.terminal = None;
        self.set_phase(GamePhase::Start);
    }

    /// Tickers, pending effects, capture, scoring, projectiles: all stop.
    fn stop_match_activity(&mut self) {
        self.directives.push(Directive::StopTickers);
        let dropped = self.timeline.cancel_all();
        if dropped > 0 {
            debug!(dropped, "Cancelled pending effects");
        }
        self.end_capture();
        if self.scoring {
            self.scoring = false;
            self.directives.push(Directive::AbortScoring);
        }
        self.projectiles.clear();
    }

    // ── Capture ────────────────────────────────────────────────────

    fn begin_capture(&mut self) {
        if self.session.phase != GamePhase::Playing || self.terminal.is_some() {
            return;
        }
        self.listening = false;
        self.current_capture = self.capture.begin(self.session.phase);
        if self.current_capture.is_none() {
            warn!(round = self.round, "Capture could not be requested");
        }
    }

    fn end_capture(&mut self) {
        self.capture.end();
        self.current_capture = None;
        self.listening = false;
    }

    fn on_capture(&mut self, event: CaptureEvent, now: Duration) {
        match event {
            CaptureEvent::Started(handle) => {
                if self.current_capture == Some(handle) {
                    self.listening = true;
                } else {
                    debug!(%handle, "Ignoring start of stale capture");
                }
            }
            CaptureEvent::Failed { handle, error } => {
                if self.current_capture != Some(handle) {
                    debug!(%handle, "Ignoring failure of stale capture");
                    return;
                }
                warn!(%handle, %error, round = self.round, "Capture failed; will retry");
                self.current_capture = None;
                self.listening = false;
                self.emit(GameEvent::CaptureFailed {
                    reason: error.to_string(),
                });
                if self.terminal.is_none() && self.stage == RoundStage::AwaitingAnswer {
                    self.schedule(now, self.settings.timing.capture_retry_ms, Step::RetryCapture);
                }
            }
            CaptureEvent::Utterance { handle, clip } => self.on_utterance(handle, clip),
        }
    }

    fn on_utterance(&mut self, handle: CaptureHandle, clip: AudioClip) {
        if self.session.phase != GamePhase::Playing || self.terminal.is_some() {
            debug!(%handle, "Ignoring utterance outside play");
            return;
        }
        if self.current_capture != Some(handle) {
            debug!(%handle, "Ignoring utterance from stale capture");
            return;
        }
        if self.stage != RoundStage::AwaitingAnswer {
            debug!(%handle, round = self.round, "Round already answered");
            return;
        }

        info!(
            round = self.round,
            word = %self.session.current_word.text,
            duration_ms = clip.duration_ms(),
            "Utterance captured"
        );
        self.stage = RoundStage::Evaluating;
        self.end_capture();
        self.scoring = true;
        self.directives.push(Directive::Score {
            epoch: self.epoch,
            round: self.round,
            word: self.session.current_word.clone(),
            clip,
        });
    }

    // ── Tickers ────────────────────────────────────────────────────

    fn on_tick(&mut self, kind: TickKind, epoch: u64, now: Duration) {
        if epoch != self.epoch
            || self.session.phase != GamePhase::Playing
            || self.terminal.is_some()
        {
            debug!(?kind, epoch, current = self.epoch, "Dropping stale tick");
            return;
        }

        match kind {
            TickKind::Physics => {
                let prev = self.session.altitude;
                let next = physics::apply_gravity(prev, self.settings.gravity_force);
                self.session.altitude = next;

                if !self.effects.animating {
                    self.rotation = physics::smooth_rotation(
                        self.rotation,
                        next,
                        self.settings.initial_altitude,
                    );
                }
                if physics::crossed_low_altitude(prev, next, self.settings.low_altitude_threshold) {
                    info!(altitude = next, "Low altitude");
                    self.emit(GameEvent::sound(SoundCue::AltitudeWarning));
                }
                self.refresh_low_altitude();

                if next == 0 {
                    self.latch(TerminalCondition::AltitudeZero, now);
                }
            }
            TickKind::Countdown => {
                self.session.time_remaining = self.session.time_remaining.saturating_sub(1);
                if self.session.time_remaining == 0 {
                    self.latch(TerminalCondition::Timeout, now);
                }
            }
        }
    }

    fn refresh_low_altitude(&mut self) {
        let altitude = self.session.altitude;
        self.effects.low_altitude =
            altitude > 0 && altitude <= self.settings.low_altitude_threshold;
    }

    // ── Scoring ────────────────────────────────────────────────────

    fn on_scored(
        &mut self,
        epoch: u64,
        round: u64,
        result: Result<ScoringResult, ScoringError>,
        now: Duration,
    ) {
        if epoch != self.epoch
            || round != self.round
            || self.stage != RoundStage::Evaluating
            || self.terminal.is_some()
        {
            debug!(epoch, round, "Dropping stale scoring result");
            return;
        }
        self.scoring = false;
        self.resolve(result, now);
    }

    // ── Timeline ───────────────────────────────────────────────────

    fn schedule(&mut self, now: Duration, after_ms: u64, step: Step) {
        self.timeline.schedule(
            now + Duration::from_millis(after_ms),
            self.epoch,
            self.round,
            step,
        );
    }

    fn run_due(&mut self, now: Duration) {
        while let Some(effect) = self.timeline.pop_due(now) {
            self.apply(effect, now);
        }
    }

    fn apply(&mut self, effect: PendingEffect, now: Duration) {
        if effect.epoch != self.epoch {
            debug!(step = ?effect.step, epoch = effect.epoch, "Dropping stale effect");
            return;
        }
        if self.terminal.is_some() && !matches!(effect.step, Step::Finale(_)) {
            debug!(step = ?effect.step, "Dropping effect after terminal");
            return;
        }
        debug!(step = ?effect.step, round = effect.round, "Timeline step");

        match effect.step {
            Step::Warmup => {
                self.emit(GameEvent::sound(SoundCue::BackgroundStart));
                self.begin_capture();
            }
            Step::RetryCapture => {
                if self.current_capture.is_none() && self.stage == RoundStage::AwaitingAnswer {
                    self.begin_capture();
                }
            }
            Step::Despawn(id) => self.projectiles.retain(|p| p.id != id),
            Step::Impact(verdict) => self.impact(verdict, now),
            Step::Rotate(rotation) => self.rotation = rotation,
            Step::LevelOff => {
                self.rotation = 0.0;
                self.effects.animating = false;
            }
            Step::ClearFlash => {
                self.effects.power_up_flash = false;
                self.effects.collision_flash = false;
            }
            Step::ReleaseCapture => self.end_capture(),
            Step::NextWord => {
                self.round += 1;
                self.session.current_word = self.vocabulary.draw(&mut self.rng);
                self.stage = RoundStage::AwaitingAnswer;
                self.prompt_word();
            }
            Step::RestartCapture => self.begin_capture(),
            Step::Finale(condition) => self.finish(condition),
        }
    }

    // ── Terminal ───────────────────────────────────────────────────

    /// Latch a terminal condition. The first one wins.
    fn latch(&mut self, condition: TerminalCondition, now: Duration) {
        if let Some(existing) = self.terminal {
            debug!(%existing, discarded = %condition, "Terminal already latched");
            return;
        }
        self.terminal = Some(condition);

        let elapsed = now.saturating_sub(self.match_started);
        info!(
            %condition,
            checkpoints = self.session.checkpoints,
            altitude = self.session.altitude,
            collisions = self.session.collision_count,
            time_remaining = self.session.time_remaining,
            "Match over"
        );

        self.stop_match_activity();
        self.emit(GameEvent::sound(SoundCue::BackgroundStop));
        if condition == TerminalCondition::Destroyed {
            self.effects.explosion = true;
            self.emit(GameEvent::sound(SoundCue::Explosion));
        }
        self.emit(GameEvent::SessionEnded {
            condition,
            final_score: self.session.checkpoints,
            final_altitude: self.session.altitude,
            collision_count: self.session.collision_count,
            time_remaining: self.session.time_remaining,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });

        let timing = &self.settings.timing;
        let finale_ms = match condition {
            TerminalCondition::Win => timing.win_finale_ms,
            TerminalCondition::Destroyed => timing.destroyed_finale_ms,
            TerminalCondition::Timeout | TerminalCondition::AltitudeZero => 0,
        };
        if finale_ms == 0 {
            self.finish(condition);
        } else {
            self.schedule(now, finale_ms, Step::Finale(condition));
        }
    }

    fn finish(&mut self, condition: TerminalCondition) {
        self.effects.animating = false;
        self.set_phase(condition.final_phase());
        self.epoch += 1;
        let cue = match condition {
            TerminalCondition::Win => SoundCue::Win,
            _ => SoundCue::GameOver,
        };
        self.emit(GameEvent::sound(cue));
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn set_phase(&mut self, to: GamePhase) {
        let from = self.session.phase;
        if from == to {
            return;
        }
        self.session.phase = to;
        info!(?from, ?to, "Phase changed");
        self.emit(GameEvent::PhaseChanged { from, to });
    }

    fn prompt_word(&self) {
        let word = &self.session.current_word;
        info!(round = self.round, word = %word.text, "Say the word");
        self.emit(GameEvent::WordPrompted {
            round: self.round,
            word: word.text.clone(),
            phonetic: word.phonetic.clone(),
        });
    }

    fn emit(&self, event: GameEvent) {
        self.emitter.emit(event);
    }
}
