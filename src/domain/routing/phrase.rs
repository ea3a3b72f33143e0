//! Word-boundary phrase matching.
//!
//! Messages and phrases are split into lowercase words, so "help" does not
//! match "helpful" and "bug" does not match "debug". A phrase ending in `*`
//! matches any word starting with its last word ("crash*" matches
//! "crashes").

/// Words that negate what follows them, in English and Kiswahili.
pub const NEGATIONS: &[&str] = &[
    "not", "no", "never", "dont", "don't", "doesnt", "doesn't", "isnt", "isn't", "cant", "can't",
    "cannot", "wont", "won't", "didnt", "didn't", "aint", "ain't", "hakuna", "si", "sio",
    "haifanyi",
];

/// How many words before a phrase a negation reaches.
const NEGATION_REACH: usize = 3;

pub fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word)
}

/// Lowercased words of `text`. Apostrophes and inner hyphens stay part of a
/// word ("can't", "m-pesa").
pub fn words(text: &str) -> Vec<String> {
    let normalized = text.to_lowercase().replace('\u{2019}', "'");
    normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .map(|w| w.trim_matches(|c| c == '\'' || c == '-'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// A sequence of words matched on word boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    words: Vec<String>,
    prefix: bool,
}

impl Phrase {
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.trim();
        let (body, prefix) = match pattern.strip_suffix('*') {
            Some(body) => (body, true),
            None => (pattern, false),
        };
        Self {
            words: words(body),
            prefix,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// True when the phrase occurs anywhere in `text`.
    pub fn occurs_in(&self, text: &[String]) -> bool {
        self.starts(text).next().is_some()
    }

    /// True when the phrase occurs at least once without a negation in the
    /// few words before it.
    pub fn occurs_affirmed_in(&self, text: &[String]) -> bool {
        self.starts(text).any(|start| {
            !text[start.saturating_sub(NEGATION_REACH)..start]
                .iter()
                .any(|w| is_negation(w))
        })
    }

    fn starts<'a>(&'a self, text: &'a [String]) -> impl Iterator<Item = usize> + 'a {
        let len = self.words.len();
        (0..(text.len() + 1).saturating_sub(len))
            .filter(move |&start| len > 0 && self.matches_at(text, start))
    }

    fn matches_at(&self, text: &[String], start: usize) -> bool {
        let last = self.words.len() - 1;
        self.words.iter().enumerate().all(|(i, word)| {
            let candidate = &text[start + i];
            if self.prefix && i == last {
                candidate.starts_with(word.as_str())
            } else {
                candidate == word
            }
        })
    }
}
