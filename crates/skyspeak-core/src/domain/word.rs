//! Prompt words and the fixed vocabulary they are drawn from.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// A word the player is asked to pronounce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    /// Display text, also sent to the scoring service as the target.
    pub text: String,
    /// IPA transcription shown under the word.
    pub phonetic: String,
}

impl Word {
    pub fn new(text: impl Into<String>, phonetic: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            phonetic: phonetic.into(),
        }
    }
}

/// Easy aviation vocabulary with simple phonetic transcriptions.
const AVIATION_WORDS: &[(&str, &str)] = &[
    ("Plane", "/pleɪn/"),
    ("Fly", "/flaɪ/"),
    ("Sky", "/skaɪ/"),
    ("Wing", "/wɪŋ/"),
    ("Pilot", "/ˈpaɪlət/"),
    ("Cloud", "/klaʊd/"),
    ("High", "/haɪ/"),
    ("Fast", "/fæst/"),
    ("Blue", "/blu/"),
    ("Wind", "/wɪnd/"),
    ("Air", "/ɛr/"),
    ("Up", "/ʌp/"),
    ("Down", "/daʊn/"),
    ("Go", "/goʊ/"),
    ("Stop", "/stɑp/"),
    ("Safe", "/seɪf/"),
    ("Land", "/lænd/"),
    ("Take", "/teɪk/"),
    ("Off", "/ɔf/"),
    ("Big", "/bɪg/"),
    ("Small", "/smɔl/"),
    ("White", "/waɪt/"),
    ("Red", "/rɛd/"),
    ("Green", "/grin/"),
    ("Yellow", "/ˈjɛloʊ/"),
    ("Sun", "/sʌn/"),
    ("Moon", "/mun/"),
    ("Star", "/stɑr/"),
    ("Light", "/laɪt/"),
    ("Bright", "/braɪt/"),
];

/// A non-empty, fixed list of words.
///
/// Draws are uniform with replacement: the same word may come up twice in a
/// row.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words: Vec<Word>,
}

impl Vocabulary {
    /// The built-in aviation vocabulary.
    pub fn aviation() -> Self {
        Self {
            words: AVIATION_WORDS
                .iter()
                .map(|(text, phonetic)| Word::new(*text, *phonetic))
                .collect(),
        }
    }

    /// Build a vocabulary from custom words. Returns `None` when `words` is empty.
    pub fn from_words(words: Vec<Word>) -> Option<Self> {
        if words.is_empty() {
            None
        } else {
            Some(Self { words })
        }
    }

    /// Draw a word uniformly at random.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Word {
        // Non-empty by construction
        self.words
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| self.words[0].clone())
    }

    /// The first word, used before any draw has happened.
    pub fn first(&self) -> &Word {
        &self.words[0]
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::aviation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn aviation_vocabulary_has_thirty_words() {
        let vocab = Vocabulary::aviation();
        assert_eq!(vocab.len(), 30);
        assert_eq!(vocab.first().text, "Plane");
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        assert!(Vocabulary::from_words(Vec::new()).is_none());
    }

    #[test]
    fn draw_is_deterministic_for_a_seed() {
        let vocab = Vocabulary::aviation();
        let a: Vec<Word> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..5).map(|_| vocab.draw(&mut rng)).collect()
        };
        let b: Vec<Word> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..5).map(|_| vocab.draw(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn single_word_vocabulary_always_repeats() {
        let vocab = Vocabulary::from_words(vec![Word::new("Sky", "/skaɪ/")]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..3 {
            assert_eq!(vocab.draw(&mut rng).text, "Sky");
        }
    }
}
