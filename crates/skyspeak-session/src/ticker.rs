//! Periodic tickers for flight physics and the match countdown.
//!
//! Each ticker is a spawned task around a `tokio::time::interval`, stopped
//! through a shared `CancellationToken`. Ticks carry the epoch they were
//! started for, so a tick that was already queued when the tickers stopped
//! is recognised as stale by the machine.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::machine::{Input, TickKind};

/// The running pair of match tickers.
#[derive(Default)]
pub struct Tickers {
    running: Option<Running>,
}

struct Running {
    epoch: u64,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Tickers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start both tickers for `epoch`, stopping any previous pair first.
    pub fn start(
        &mut self,
        epoch: u64,
        physics_period: Duration,
        countdown_period: Duration,
        tx: &mpsc::UnboundedSender<Input>,
    ) {
        self.stop();

        let cancel = CancellationToken::new();
        let tasks = vec![
            spawn_ticker(TickKind::Physics, epoch, physics_period, tx.clone(), cancel.clone()),
            spawn_ticker(
                TickKind::Countdown,
                epoch,
                countdown_period,
                tx.clone(),
                cancel.clone(),
            ),
        ];
        debug!(epoch, "Tickers started");
        self.running = Some(Running {
            epoch,
            cancel,
            tasks,
        });
    }

    /// Stop both tickers. Idempotent.
    pub fn stop(&mut self) {
        if let Some(Running { epoch, cancel, tasks }) = self.running.take() {
            cancel.cancel();
            for task in tasks {
                task.abort();
            }
            debug!(epoch, "Tickers stopped");
        }
    }

    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for Tickers {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_ticker(
    kind: TickKind,
    epoch: u64,
    period: Duration,
    tx: mpsc::UnboundedSender<Input>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // First tick one full period after start.
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if tx.send(Input::Tick { kind, epoch }).is_err() {
                        break;
                    }
                }
                () = cancel.cancelled() => {
                    debug!(?kind, epoch, "Ticker cancelled");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_at_period_with_epoch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tickers = Tickers::new();
        tickers.start(3, Duration::from_millis(150), Duration::from_secs(1), &tx);

        tokio::time::sleep(Duration::from_millis(1_010)).await;
        tickers.stop();

        let mut physics = 0;
        let mut countdown = 0;
        while let Ok(input) = rx.try_recv() {
            match input {
                Input::Tick {
                    kind: TickKind::Physics,
                    epoch: 3,
                } => physics += 1,
                Input::Tick {
                    kind: TickKind::Countdown,
                    epoch: 3,
                } => countdown += 1,
                other => panic!("unexpected input {other:?}"),
            }
        }
        assert_eq!(physics, 6);
        assert_eq!(countdown, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_silences() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tickers = Tickers::new();
        tickers.start(1, Duration::from_millis(100), Duration::from_millis(100), &tx);
        assert!(tickers.is_running());

        tickers.stop();
        tickers.stop();
        assert!(!tickers.is_running());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
