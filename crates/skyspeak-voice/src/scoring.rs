//! Pronunciation scoring adapters.
//!
//! [`HttpScoringGateway`] talks to the external scoring service;
//! [`ScriptedScorer`] replays canned results for simulations.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use skyspeak_core::{AudioClip, PronunciationScorer, ScoringError, ScoringResult, Word};
use tokio::sync::Mutex;

use crate::wav;

/// Default scoring endpoint (a locally running scoring service).
pub const DEFAULT_SCORING_ENDPOINT: &str = "http://127.0.0.1:8000/pronunciation/score";

/// Scoring service connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub endpoint: String,
    /// Whole-request timeout.
    pub timeout_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SCORING_ENDPOINT.to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Multipart HTTP client for the scoring service.
///
/// Sends the target word as a `text` field and the utterance as an `audio`
/// WAV file part. One attempt per utterance; failures are never retried.
#[derive(Debug, Clone)]
pub struct HttpScoringGateway {
    client: reqwest::Client,
    config: ScoringConfig,
}

impl HttpScoringGateway {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ScoringError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl PronunciationScorer for HttpScoringGateway {
    async fn score(&self, word: &Word, clip: &AudioClip) -> Result<ScoringResult, ScoringError> {
        let audio = Part::bytes(wav::encode_pcm16(clip))
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(|e| ScoringError::Transport(e.to_string()))?;
        let form = Form::new().text("text", word.text.clone()).part("audio", audio);

        tracing::debug!(
            word = %word.text,
            duration_ms = clip.duration_ms(),
            endpoint = %self.config.endpoint,
            "Submitting utterance for scoring"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport)?;
        if !status.is_success() {
            return Err(ScoringError::Service {
                status: status.as_u16(),
                body,
            });
        }

        parse_score(&body)
    }
}

fn classify_transport(err: reqwest::Error) -> ScoringError {
    if err.is_timeout() {
        ScoringError::Timeout
    } else {
        ScoringError::Transport(err.to_string())
    }
}

/// Extract `total_score` (or `totalScore`) in [0, 1] from a response body.
fn parse_score(body: &str) -> Result<ScoringResult, ScoringError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ScoringError::MalformedResponse(e.to_string()))?;

    let raw = value
        .get("total_score")
        .or_else(|| value.get("totalScore"))
        .filter(|v| !v.is_null())
        .ok_or(ScoringError::MissingScore)?;

    let score = raw
        .as_f64()
        .ok_or_else(|| ScoringError::MalformedResponse(format!("total_score is not a number: {raw}")))?;

    if !(0.0..=1.0).contains(&score) {
        return Err(ScoringError::MalformedResponse(format!(
            "total_score {score} outside [0, 1]"
        )));
    }

    #[allow(clippy::cast_possible_truncation)]
    Ok(ScoringResult::new(score as f32))
}

/// Replays a fixed sequence of scoring outcomes.
///
/// Once the script is exhausted every request fails with
/// [`ScoringError::MissingScore`].
pub struct ScriptedScorer {
    latency: Duration,
    script: Mutex<VecDeque<Result<ScoringResult, ScoringError>>>,
}

impl ScriptedScorer {
    pub fn new(
        latency: Duration,
        script: impl IntoIterator<Item = Result<ScoringResult, ScoringError>>,
    ) -> Self {
        Self {
            latency,
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl PronunciationScorer for ScriptedScorer {
    async fn score(&self, word: &Word, _clip: &AudioClip) -> Result<ScoringResult, ScoringError> {
        tokio::time::sleep(self.latency).await;
        let next = self.script.lock().await.pop_front();
        tracing::debug!(word = %word.text, ?next, "Scripted score");
        next.unwrap_or(Err(ScoringError::MissingScore))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snake_and_camel_case() {
        assert_eq!(parse_score(r#"{"total_score": 0.8}"#).unwrap().total_score, 0.8);
        assert_eq!(parse_score(r#"{"totalScore": 0.25}"#).unwrap().total_score, 0.25);
    }

    #[test]
    fn rejects_bad_bodies() {
        assert_eq!(parse_score("{}"), Err(ScoringError::MissingScore));
        assert_eq!(
            parse_score(r#"{"total_score": null}"#),
            Err(ScoringError::MissingScore)
        );
        assert!(matches!(
            parse_score("not json"),
            Err(ScoringError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_score(r#"{"total_score": "high"}"#),
            Err(ScoringError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_score(r#"{"total_score": 1.5}"#),
            Err(ScoringError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn scripted_scorer_runs_dry() {
        let scorer = ScriptedScorer::new(Duration::ZERO, [Ok(ScoringResult::new(0.9))]);
        let word = Word::new("Sky", "/skaɪ/");
        let clip = AudioClip::new(vec![0.0; 4], 16_000);

        assert!(scorer.score(&word, &clip).await.is_ok());
        assert_eq!(scorer.remaining().await, 0);
        assert_eq!(
            scorer.score(&word, &clip).await,
            Err(ScoringError::MissingScore)
        );
    }
}
