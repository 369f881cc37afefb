use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::data::filter::FilteredRows;
use crate::error::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermSettings {
    /// Most frequent terms kept for the cloud.
    pub max_terms: usize,
    /// Shorter tokens are dropped.
    pub min_length: usize,
}

impl Default for TermSettings {
    fn default() -> Self {
        Self {
            max_terms: 100,
            min_length: 2,
        }
    }
}

/// A word and how prominently the cloud should draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermWeight {
    pub term: String,
    pub count: usize,
    /// `count` relative to the most frequent term, in `(0, 1]`.
    pub weight: f64,
}

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "can't", "cannot", "com", "could", "couldn't", "did", "didn't",
    "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "else", "ever", "few",
    "for", "from", "further", "get", "had", "hadn't", "has", "hasn't", "have", "haven't",
    "having", "he", "he'd", "he'll", "he's", "hence", "her", "here", "here's", "hers", "herself",
    "him", "himself", "his", "how", "how's", "however", "http", "i", "i'd", "i'll", "i'm", "i've",
    "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "just", "k", "let's",
    "like", "me", "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off",
    "on", "once", "only", "or", "other", "otherwise", "ought", "our", "ours", "ourselves", "out",
    "over", "own", "r", "same", "shall", "shan't", "she", "she'd", "she'll", "she's", "should",
    "shouldn't", "since", "so", "some", "such", "than", "that", "that's", "the", "their",
    "theirs", "them", "themselves", "then", "there", "there's", "therefore", "these", "they",
    "they'd", "they'll", "they're", "they've", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "wasn't", "we", "we'd", "we'll", "we're", "we've", "were",
    "weren't", "what", "what's", "when", "when's", "where", "where's", "which", "while", "who",
    "who's", "whom", "why", "why's", "with", "won't", "would", "wouldn't", "www", "you",
    "you'd", "you'll", "you're", "you've", "your", "yours", "yourself", "yourselves",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Lower-cased words of `text`, apostrophes kept inside words only.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|token| token.trim_matches('\'').to_lowercase())
        .filter(|token| !token.is_empty())
}

/// Word counts over the transcripts of `rows`, most frequent first (ties by
/// term). A trailing `'s` is dropped and a plural is counted under its
/// singular when both occur. [`Outcome::Empty`] when no row has a transcript.
pub fn term_frequencies(rows: &FilteredRows<'_>, settings: &TermSettings) -> Outcome<Vec<TermWeight>> {
    let mut saw_text = false;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in rows.iter().filter_map(|r| r.transcription()) {
        saw_text = true;
        for token in tokenize(text) {
            if stopwords().contains(token.as_str()) {
                continue;
            }
            let word = token.strip_suffix("'s").unwrap_or(&token);
            if word.chars().count() < settings.min_length
                || word.chars().all(|c| c.is_ascii_digit())
            {
                continue;
            }
            *counts.entry(word.to_string()).or_default() += 1;
        }
    }
    fold_plurals(&mut counts);
    if !saw_text {
        return Outcome::Empty;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(settings.max_terms);

    let top = ranked.first().map(|(_, c)| *c).unwrap_or(1) as f64;
    Outcome::Ready(
        ranked
            .into_iter()
            .map(|(term, count)| TermWeight {
                term,
                count,
                weight: count as f64 / top,
            })
            .collect(),
    )
}

/// Merge `word`s into `word` when both were counted; `ss` endings stay.
fn fold_plurals(counts: &mut HashMap<String, usize>) {
    let plurals: Vec<String> = counts
        .keys()
        .filter(|w| w.ends_with('s') && !w.ends_with("ss") && counts.contains_key(&w[..w.len() - 1]))
        .cloned()
        .collect();
    for plural in plurals {
        if let Some(n) = counts.remove(&plural) {
            *counts.entry(plural[..plural.len() - 1].to_string()).or_default() += n;
        }
    }
}
