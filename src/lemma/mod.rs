//! Lemma extraction
//!
//! Turns free text into normalized index terms. The extractor is a stateless
//! service built once and shared by the crawler, the single-page indexer and
//! the search engine.

use crate::config::Language;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{BTreeSet, HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

/// Extracts lemmas from text
pub trait LemmaExtractor: Send + Sync {
    /// Returns each lemma of `text` with its number of occurrences
    fn lemma_counts(&self, text: &str) -> HashMap<String, u32>;

    /// Returns the distinct lemmas of `text`
    fn lemma_set(&self, text: &str) -> BTreeSet<String> {
        self.lemma_counts(text).into_keys().collect()
    }
}

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on", "once",
    "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

// Prepositions, conjunctions, particles and interjections
const RUSSIAN_STOPWORDS: &[&str] = &[
    "а", "ах", "без", "бы", "в", "во", "вот", "да", "для", "до", "же", "за", "и", "из", "или",
    "к", "ко", "ли", "либо", "на", "над", "не", "нет", "ни", "но", "о", "об", "ой", "от", "по",
    "под", "при", "про", "с", "со", "так", "то", "тоже", "у", "ух", "через", "что", "чтобы", "эх",
];

/// Snowball stemming extractor
///
/// Words are NFKC-normalized and lowercased, stopwords are dropped and the
/// remaining words are reduced to their stem with the configured language.
pub struct StemmingExtractor {
    word: Regex,
    stemmer: Stemmer,
    stopwords: HashSet<&'static str>,
}

impl StemmingExtractor {
    /// Creates an extractor for the given language
    pub fn new(language: Language) -> Result<Self, regex::Error> {
        let algorithm = match language {
            Language::English => Algorithm::English,
            Language::Russian => Algorithm::Russian,
        };

        Ok(Self {
            word: Regex::new(r"\p{L}+")?,
            stemmer: Stemmer::create(algorithm),
            stopwords: ENGLISH_STOPWORDS
                .iter()
                .chain(RUSSIAN_STOPWORDS.iter())
                .copied()
                .collect(),
        })
    }

    /// Reduces one lowercase word to its lemma, or None for a stopword
    fn lemma(&self, word: &str) -> Option<String> {
        if self.stopwords.contains(word) {
            return None;
        }
        Some(self.stemmer.stem(word).into_owned())
    }
}

impl LemmaExtractor for StemmingExtractor {
    fn lemma_counts(&self, text: &str) -> HashMap<String, u32> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut counts = HashMap::new();

        for found in self.word.find_iter(&normalized) {
            if let Some(lemma) = self.lemma(found.as_str()) {
                *counts.entry(lemma).or_insert(0) += 1;
            }
        }

        counts
    }
}
