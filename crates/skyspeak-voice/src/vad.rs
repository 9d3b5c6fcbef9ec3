//! Energy-gated utterance segmentation.
//!
//! A capture device pushes frames into an [`UtteranceSegmenter`] as they
//! arrive. Once a voiced run has lasted `min_speech_duration_ms` the
//! segmenter reports an [`Segment::Onset`]; once `min_silence_duration_ms`
//! of quiet follows, it hands back the whole take as an [`AudioClip`] with
//! at most `speech_pad_ms` of trailing quiet kept.

use serde::{Deserialize, Serialize};
use skyspeak_core::AudioClip;

/// RMS level the gate opens at for `threshold = 0.0`.
const MIN_GATE_LEVEL: f32 = 0.001;

/// RMS level the gate opens at for `threshold = 1.0`.
const MAX_GATE_LEVEL: f32 = 0.05;

/// Segmentation settings, read from the `vad` section of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// Gate sensitivity in `[0, 1]`; higher needs a louder voice.
    pub threshold: f32,

    /// Quiet needed after speech before the take is complete.
    pub min_silence_duration_ms: u32,

    /// Voiced run needed before a take starts. Shorter bursts are dropped.
    pub min_speech_duration_ms: u32,

    /// Trailing quiet kept on a completed take.
    pub speech_pad_ms: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            min_silence_duration_ms: 700,
            min_speech_duration_ms: 250,
            speech_pad_ms: 200,
        }
    }
}

/// What a frame pushed into the segmenter produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A voiced run just became long enough to count as speech.
    Onset,
    /// A take finished.
    Utterance(AudioClip),
}

/// RMS level gate.
#[derive(Debug, Clone, Copy)]
struct EnergyGate {
    level: f32,
}

impl EnergyGate {
    /// Linear map of `threshold` onto `[MIN_GATE_LEVEL, MAX_GATE_LEVEL]`.
    fn from_threshold(threshold: f32) -> Self {
        let level =
            (MAX_GATE_LEVEL - MIN_GATE_LEVEL).mul_add(threshold.clamp(0.0, 1.0), MIN_GATE_LEVEL);
        Self { level }
    }

    fn is_voiced(self, frame: &[f32]) -> bool {
        rms(frame) > self.level
    }
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let len = frame.len() as f32;
    (frame.iter().map(|s| s * s).sum::<f32>() / len).sqrt()
}

/// Splits a mono frame stream into utterances.
pub struct UtteranceSegmenter {
    config: VadConfig,
    gate: EnergyGate,
    sample_rate: u32,
    /// Samples of the take in progress, or of the voiced run before onset.
    take: Vec<f32>,
    in_take: bool,
    voiced_ms: u32,
    quiet_ms: u32,
    /// Quiet samples currently at the end of `take`.
    quiet_tail: usize,
}

impl UtteranceSegmenter {
    pub fn new(config: VadConfig, sample_rate: u32) -> Self {
        let gate = EnergyGate::from_threshold(config.threshold);
        Self {
            config,
            gate,
            sample_rate,
            take: Vec::new(),
            in_take: false,
            voiced_ms: 0,
            quiet_ms: 0,
            quiet_tail: 0,
        }
    }

    pub fn push(&mut self, frame: &[f32]) -> Option<Segment> {
        if frame.is_empty() || self.sample_rate == 0 {
            return None;
        }
        let voiced = self.gate.is_voiced(frame);
        let frame_ms = self.millis(frame.len());

        if !self.in_take {
            if !voiced {
                // A burst shorter than the minimum is noise.
                self.take.clear();
                self.voiced_ms = 0;
                return None;
            }
            self.take.extend_from_slice(frame);
            self.voiced_ms += frame_ms;
            if self.voiced_ms < self.config.min_speech_duration_ms {
                return None;
            }
            self.in_take = true;
            self.quiet_ms = 0;
            self.quiet_tail = 0;
            tracing::debug!(voiced_ms = self.voiced_ms, "Speech onset");
            return Some(Segment::Onset);
        }

        self.take.extend_from_slice(frame);
        if voiced {
            self.quiet_ms = 0;
            self.quiet_tail = 0;
            return None;
        }
        self.quiet_ms += frame_ms;
        self.quiet_tail += frame.len();
        (self.quiet_ms >= self.config.min_silence_duration_ms)
            .then(|| Segment::Utterance(self.complete()))
    }

    /// Whether a take is in progress.
    pub const fn in_utterance(&self) -> bool {
        self.in_take
    }

    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Drop any partial take.
    pub fn clear(&mut self) {
        self.take.clear();
        self.in_take = false;
        self.voiced_ms = 0;
        self.quiet_ms = 0;
        self.quiet_tail = 0;
    }

    #[allow(clippy::cast_possible_truncation)]
    fn complete(&mut self) -> AudioClip {
        let pad = (u64::from(self.config.speech_pad_ms) * u64::from(self.sample_rate) / 1000) as usize;
        let trim = self.quiet_tail.saturating_sub(pad);

        let mut samples = std::mem::take(&mut self.take);
        samples.truncate(samples.len().saturating_sub(trim));
        self.clear();

        let clip = AudioClip::new(samples, self.sample_rate);
        tracing::debug!(duration_ms = clip.duration_ms(), "Utterance complete");
        clip
    }

    #[allow(clippy::cast_possible_truncation)]
    fn millis(&self, samples: usize) -> u32 {
        (samples as u64 * 1000 / u64::from(self.sample_rate)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;
    /// 50 ms at 16 kHz.
    const FRAME: usize = 800;

    fn voice() -> Vec<f32> {
        vec![0.3; FRAME]
    }

    fn hush() -> Vec<f32> {
        vec![0.0; FRAME]
    }

    fn segmenter() -> UtteranceSegmenter {
        UtteranceSegmenter::new(VadConfig::default(), RATE)
    }

    #[test]
    fn click_shorter_than_min_speech_is_dropped() {
        let mut seg = segmenter();
        assert!(seg.push(&voice()).is_none());
        assert!(seg.push(&hush()).is_none());
        assert!(!seg.in_utterance());

        // The earlier burst does not count toward the next onset.
        for _ in 0..4 {
            assert!(seg.push(&voice()).is_none());
        }
        assert_eq!(seg.push(&voice()), Some(Segment::Onset));
    }

    #[test]
    fn take_completes_after_min_silence_with_padding() {
        let mut seg = segmenter();

        let onsets: Vec<_> = (0..6).filter_map(|_| seg.push(&voice())).collect();
        assert_eq!(onsets, vec![Segment::Onset]);
        assert!(seg.in_utterance());

        // 650 ms of quiet is not enough.
        for _ in 0..13 {
            assert!(seg.push(&hush()).is_none());
        }

        let Some(Segment::Utterance(clip)) = seg.push(&hush()) else {
            panic!("expected a completed take after 700 ms of quiet");
        };
        // 300 ms voiced + 200 ms pad
        assert_eq!(clip.samples.len(), 10 * FRAME);
        assert_eq!(clip.duration_ms(), 500);
        assert!(!seg.in_utterance());
    }

    #[test]
    fn speech_inside_a_take_resets_the_quiet_count() {
        let mut seg = segmenter();
        for _ in 0..5 {
            seg.push(&voice());
        }
        for _ in 0..10 {
            assert!(seg.push(&hush()).is_none());
        }
        assert!(seg.push(&voice()).is_none());
        for _ in 0..13 {
            assert!(seg.push(&hush()).is_none());
        }
        assert!(matches!(seg.push(&hush()), Some(Segment::Utterance(_))));
    }

    #[test]
    fn clear_discards_partial_take() {
        let mut seg = segmenter();
        for _ in 0..5 {
            seg.push(&voice());
        }
        seg.clear();
        assert!(!seg.in_utterance());
        for _ in 0..20 {
            assert!(seg.push(&hush()).is_none());
        }
    }

    #[test]
    fn gate_level_follows_threshold() {
        assert!((EnergyGate::from_threshold(0.0).level - MIN_GATE_LEVEL).abs() < 1e-6);
        assert!((EnergyGate::from_threshold(1.0).level - MAX_GATE_LEVEL).abs() < 1e-6);
        assert!((EnergyGate::from_threshold(7.0).level - MAX_GATE_LEVEL).abs() < 1e-6);
        assert!(rms(&[]).abs() < f32::EPSILON);
        assert!((rms(&[1.0; 16]) - 1.0).abs() < f32::EPSILON);
    }
}
