//! Story pagination
//!
//! Stories are read two sentences per page. A sentence ends at a run of
//! `.`, `!` or `?`; trailing text without a terminator is a sentence too.

use serde::Serialize;

/// Sentences shown on one page
pub const SENTENCES_PER_PAGE: usize = 2;

/// One page of a story
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryPage {
    pub index: usize,
    pub text: String,
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text into trimmed, non-empty sentences
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if is_terminator(c) {
            while let Some(&next) = chars.peek() {
                if !is_terminator(next) {
                    break;
                }
                current.push(next);
                chars.next();
            }
            push_sentence(&mut sentences, &mut current);
        }
    }
    push_sentence(&mut sentences, &mut current);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
    current.clear();
}

/// Group sentences into pages
pub fn paginate(text: &str) -> Vec<StoryPage> {
    split_sentences(text)
        .chunks(SENTENCES_PER_PAGE)
        .enumerate()
        .map(|(index, chunk)| StoryPage {
            index,
            text: chunk.join(" "),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_keeps_terminators() {
        let sentences = split_sentences("Il était une fois Emma. Elle rit! Pourquoi?! Fin...");
        assert_eq!(
            sentences,
            vec!["Il était une fois Emma.", "Elle rit!", "Pourquoi?!", "Fin..."]
        );
    }

    #[test]
    fn test_trailing_fragment_is_a_sentence() {
        assert_eq!(
            split_sentences("Bonjour. Et puis"),
            vec!["Bonjour.", "Et puis"]
        );
    }

    #[test]
    fn test_two_sentences_per_page() {
        let pages = paginate("Un. Deux. Trois.");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text, "Un. Deux.");
        assert_eq!(pages[1].index, 1);
        assert_eq!(pages[1].text, "Trois.");
    }

    #[test]
    fn test_empty_text_has_no_pages() {
        assert!(paginate("").is_empty());
        assert!(paginate("   \n ").is_empty());
    }

    proptest! {
        #[test]
        fn prop_page_count_is_half_rounded_up(words in proptest::collection::vec("[a-zA-Z]{1,8}", 0..40)) {
            let text = words.iter().map(|w| format!("{w}.")).collect::<Vec<_>>().join(" ");
            let n = words.len();
            let pages = paginate(&text);
            prop_assert_eq!(pages.len(), n.div_ceil(SENTENCES_PER_PAGE));
            prop_assert_eq!(pages.first().is_some(), n > 0);
        }

        #[test]
        fn prop_no_text_is_lost(text in "[a-z .!?]{0,120}") {
            let joined: String = split_sentences(&text).concat();
            let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
            prop_assert_eq!(strip(&joined), strip(&text));
        }
    }
}
