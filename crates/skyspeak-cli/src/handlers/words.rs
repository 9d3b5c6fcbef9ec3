//! Words command handler.

use anyhow::Result;
use skyspeak_core::Vocabulary;

/// Print the built-in vocabulary.
pub fn execute() -> Result<()> {
    let vocabulary = Vocabulary::aviation();
    println!("{} words:", vocabulary.len());
    for line in format_words(&vocabulary) {
        println!("{line}");
    }
    Ok(())
}

/// One aligned line per word.
pub fn format_words(vocabulary: &Vocabulary) -> Vec<String> {
    let width = vocabulary
        .words()
        .iter()
        .map(|w| w.text.chars().count())
        .max()
        .unwrap_or(0);
    vocabulary
        .words()
        .iter()
        .map(|w| format!("  {:<width$}  {}", w.text, w.phonetic))
        .collect()
}

#[cfg(test)]
mod tests {
    use skyspeak_core::Word;

    use super::*;

    #[test]
    fn words_are_aligned() {
        let vocabulary =
            Vocabulary::from_words(vec![Word::new("Sky", "/skaɪ/"), Word::new("Runway", "RUN-way")])
                .unwrap();
        assert_eq!(
            format_words(&vocabulary),
            vec!["  Sky     /skaɪ/".to_string(), "  Runway  RUN-way".to_string()]
        );
    }
}
