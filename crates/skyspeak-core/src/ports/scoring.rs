//! Pronunciation scoring port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{AudioClip, ScoringResult, Word};

/// Why a scoring attempt produced no usable score.
///
/// Every variant is treated as an incorrect answer; none is retried.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    #[error("Scoring request failed: {0}")]
    Transport(String),

    #[error("Scoring request timed out")]
    Timeout,

    #[error("Scoring service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Malformed scoring response: {0}")]
    MalformedResponse(String),

    #[error("Scoring response has no total score")]
    MissingScore,
}

/// Grades one utterance against its target word.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PronunciationScorer: Send + Sync {
    async fn score(&self, word: &Word, clip: &AudioClip) -> Result<ScoringResult, ScoringError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Verdict;

    #[tokio::test]
    async fn mocked_scorer_failure_is_incorrect() {
        let mut scorer = MockPronunciationScorer::new();
        scorer
            .expect_score()
            .times(1)
            .returning(|_, _| Err(ScoringError::MissingScore));

        let result = scorer
            .score(&Word::new("Sky", "/skaɪ/"), &AudioClip::new(vec![0.0; 160], 16_000))
            .await;
        assert_eq!(Verdict::classify(&result, 50.0), Verdict::Incorrect);
    }
}
