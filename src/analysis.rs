//! Text normalization for documents and queries.
//!
//! The ranking core only ever sees token sequences; this module is the thin
//! contract that produces them. [`Analyzer`] is the pluggable seam, and
//! [`StandardAnalyzer`] is the default pipeline: Unicode word segmentation,
//! lowercasing, diacritic folding, and English stopword removal. Stemming is
//! deliberately not part of the default pipeline.

use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;

/// English stopwords removed by the standard analyzer.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from",
    "had", "has", "have", "he", "her", "his", "i", "if", "in", "into", "is",
    "it", "its", "no", "not", "of", "on", "or", "she", "such", "that", "the",
    "their", "then", "there", "these", "they", "this", "to", "was", "we",
    "were", "which", "will", "with", "you",
];

/// Trait for text analyzers that convert raw text into normalized tokens.
///
/// Analyzers must be deterministic: identical input text always produces the
/// identical token sequence. The trait requires `Send + Sync` so a single
/// analyzer can serve concurrent searches.
pub trait Analyzer: Send + Sync {
    /// Normalize the given text into an ordered token sequence.
    ///
    /// Duplicate tokens are preserved; downstream models rely on raw term
    /// frequency.
    fn analyze(&self, text: &str) -> Result<Vec<String>>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// The default analysis pipeline.
///
/// Splits on Unicode word boundaries, lowercases, folds common Latin
/// diacritics to ASCII, drops tokens with no alphanumeric content, and
/// removes English stopwords.
#[derive(Debug, Clone, Default)]
pub struct StandardAnalyzer;

impl StandardAnalyzer {
    /// Create a new standard analyzer.
    pub fn new() -> Self {
        StandardAnalyzer
    }

    fn normalize_token(token: &str) -> Option<String> {
        let folded: String = token
            .chars()
            .flat_map(|c| c.to_lowercase())
            .map(fold_diacritic)
            .collect();

        if !folded.chars().any(|c| c.is_alphanumeric()) {
            return None;
        }
        if STOPWORDS.contains(&folded.as_str()) {
            return None;
        }
        Some(folded)
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<String>> {
        Ok(text
            .unicode_words()
            .filter_map(Self::normalize_token)
            .collect())
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

/// Fold common Latin diacritics to their ASCII base letter.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => c,
    }
}
