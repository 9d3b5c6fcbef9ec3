//! End-to-end session tests.
//!
//! Run a real controller against the scripted capture device and scorer on a
//! paused clock, and check what the player would observe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use skyspeak_core::{
    AudioClip, CaptureError, ChannelEmitter, GameEvent, GamePhase, GameSettings,
    PronunciationScorer, ScoringError, ScoringResult, TerminalCondition, Verdict, Vocabulary,
    Word,
};
use skyspeak_session::{SessionConfig, SessionError, SessionHandle, spawn_session};
use skyspeak_voice::{ScriptedCaptureDevice, ScriptedScorer, ScriptedTake};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::sleep;

mock! {
    Scorer {}

    #[async_trait]
    impl PronunciationScorer for Scorer {
        async fn score(&self, word: &Word, clip: &AudioClip) -> Result<ScoringResult, ScoringError>;
    }
}

fn clip() -> AudioClip {
    AudioClip::new(vec![0.3; 1_600], 16_000)
}

fn config(settings: GameSettings) -> SessionConfig {
    SessionConfig {
        settings,
        vocabulary: Vocabulary::aviation(),
        seed: Some(42),
    }
}

fn spawn(
    settings: GameSettings,
    device: Arc<ScriptedCaptureDevice>,
    scorer: Arc<dyn PronunciationScorer>,
) -> (SessionHandle, UnboundedReceiver<GameEvent>) {
    let (emitter, events) = ChannelEmitter::new();
    let handle = spawn_session(config(settings), device, scorer, Arc::new(emitter))
        .expect("valid settings");
    (handle, events)
}

fn drain(events: &mut UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn ended(events: &[GameEvent]) -> Vec<TerminalCondition> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::SessionEnded { condition, .. } => Some(*condition),
            _ => None,
        })
        .collect()
}

fn scored(events: &[GameEvent]) -> Vec<Verdict> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::AnswerScored { verdict, .. } => Some(*verdict),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn scripted_match_reaches_win() {
    let settings = GameSettings {
        win_score: 3,
        ..GameSettings::default()
    };
    let device = Arc::new(ScriptedCaptureDevice::new(Duration::from_millis(300)).with_fallback(clip()));
    let stats = device.stats();
    let scorer = Arc::new(ScriptedScorer::new(
        Duration::from_millis(200),
        vec![Ok(ScoringResult::new(0.9)); 3],
    ));
    let (handle, mut events) = spawn(settings, device, scorer);

    handle.start().unwrap();
    handle.play().unwrap();
    sleep(Duration::from_secs(20)).await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.session.phase, GamePhase::Win);
    assert_eq!(snapshot.session.checkpoints, 3);
    assert_eq!(snapshot.terminal, Some(TerminalCondition::Win));
    assert!(!snapshot.listening);

    let events = drain(&mut events);
    assert_eq!(ended(&events), vec![TerminalCondition::Win]);
    assert_eq!(scored(&events), vec![Verdict::Correct; 3]);

    assert_eq!(stats.acquisitions(), 3);
    assert_eq!(stats.peak_active(), 1);
    assert_eq!(stats.active(), 0);

    handle.exit().unwrap();
    handle.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn each_utterance_is_scored_once() {
    let settings = GameSettings {
        win_score: 1,
        ..GameSettings::default()
    };
    let mut scorer = MockScorer::new();
    scorer
        .expect_score()
        .times(1)
        .returning(|_, _| Ok(ScoringResult::new(0.95)));
    let scorer = Arc::new(scorer);

    let device = Arc::new(ScriptedCaptureDevice::new(Duration::from_millis(300)).with_fallback(clip()));
    let (handle, mut events) = spawn(settings, device, scorer.clone());

    handle.start().unwrap();
    handle.play().unwrap();
    sleep(Duration::from_secs(10)).await;

    assert_eq!(handle.snapshot().session.phase, GamePhase::Win);
    assert_eq!(scored(&drain(&mut events)), vec![Verdict::Correct]);

    handle.join().await.unwrap();
    // Last reference: the mock verifies its call count here.
    drop(scorer);
}

#[tokio::test(start_paused = true)]
async fn utterance_from_superseded_capture_is_dropped() {
    // First capture answers late; by then the match was restarted.
    let device = Arc::new(
        ScriptedCaptureDevice::new(Duration::from_millis(2_000))
            .with_script([ScriptedTake::Utterance(clip()), ScriptedTake::Silence]),
    );
    let stats = device.stats();
    let scorer = Arc::new(ScriptedScorer::new(
        Duration::from_millis(100),
        [Ok(ScoringResult::new(0.9))],
    ));
    let (handle, mut events) = spawn(GameSettings::default(), device, scorer.clone());

    handle.start().unwrap();
    handle.play().unwrap();
    sleep(Duration::from_millis(1_500)).await;
    assert!(handle.snapshot().listening);

    handle.restart().unwrap();
    handle.start().unwrap();
    handle.play().unwrap();
    sleep(Duration::from_millis(3_500)).await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.session.phase, GamePhase::Playing);
    assert_eq!(snapshot.round, 1);
    assert!(scored(&drain(&mut events)).is_empty());
    assert_eq!(scorer.remaining().await, 1);

    assert_eq!(stats.acquisitions(), 2);
    assert_eq!(stats.peak_active(), 1);

    handle.join().await.unwrap();
    assert_eq!(stats.active(), 0);
}

#[tokio::test(start_paused = true)]
async fn countdown_expiry_ends_match_and_releases_capture() {
    let settings = GameSettings {
        time_limit_secs: 2,
        ..GameSettings::default()
    };
    let device = Arc::new(ScriptedCaptureDevice::new(Duration::from_millis(100)));
    let stats = device.stats();
    let scorer = Arc::new(ScriptedScorer::new(Duration::ZERO, []));
    let (handle, mut events) = spawn(settings, device, scorer);

    handle.start().unwrap();
    handle.play().unwrap();
    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(stats.active(), 1);

    sleep(Duration::from_secs(2)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.session.phase, GamePhase::GameOver);
    assert_eq!(snapshot.session.time_remaining, 0);
    assert_eq!(snapshot.terminal, Some(TerminalCondition::Timeout));
    assert_eq!(stats.active(), 0);

    let events = drain(&mut events);
    assert_eq!(ended(&events), vec![TerminalCondition::Timeout]);
    let elapsed = events.iter().find_map(|e| match e {
        GameEvent::SessionEnded { elapsed_ms, .. } => Some(*elapsed_ms),
        _ => None,
    });
    assert_eq!(elapsed, Some(2_000));

    handle.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_capture_is_retried() {
    let device = Arc::new(
        ScriptedCaptureDevice::new(Duration::from_millis(200)).with_script([
            ScriptedTake::Fail(CaptureError::Unavailable("device busy".into())),
            ScriptedTake::Utterance(clip()),
        ]),
    );
    let scorer = Arc::new(ScriptedScorer::new(
        Duration::from_millis(100),
        [Ok(ScoringResult::new(0.2))],
    ));
    let (handle, mut events) = spawn(GameSettings::default(), device, scorer);

    handle.start().unwrap();
    handle.play().unwrap();
    sleep(Duration::from_secs(4)).await;

    let events = drain(&mut events);
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::CaptureFailed { reason } if reason.contains("device busy"))));
    assert_eq!(scored(&events), vec![Verdict::Incorrect]);

    handle.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn exit_stops_the_controller() {
    let device = Arc::new(ScriptedCaptureDevice::new(Duration::from_millis(100)));
    let scorer = Arc::new(ScriptedScorer::new(Duration::ZERO, []));
    let (handle, mut events) = spawn(GameSettings::default(), device, scorer);

    let mut snapshots = handle.subscribe();
    handle.start().unwrap();
    snapshots.changed().await.unwrap();
    assert_eq!(snapshots.borrow().session.phase, GamePhase::Instructions);

    handle.exit().unwrap();
    sleep(Duration::from_millis(10)).await;
    assert!(handle.is_finished());
    assert_eq!(handle.play(), Err(SessionError::ControllerStopped));

    let events = drain(&mut events);
    assert_eq!(events.last(), Some(&GameEvent::Exited { final_score: 0 }));

    handle.join().await.unwrap();
}

#[test]
fn invalid_settings_are_rejected_before_spawning() {
    let settings = GameSettings {
        win_score: 0,
        ..GameSettings::default()
    };
    let device = Arc::new(ScriptedCaptureDevice::new(Duration::ZERO));
    let scorer = Arc::new(ScriptedScorer::new(Duration::ZERO, []));
    let (emitter, _events) = ChannelEmitter::new();

    let result = spawn_session(config(settings), device, scorer, Arc::new(emitter));
    assert!(matches!(result, Err(SessionError::InvalidSettings(_))));
}
