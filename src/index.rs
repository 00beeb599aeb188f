//! The lexical index: shared corpus statistics for both ranking models.
//!
//! [`LexicalIndex::build`] turns a token corpus into the structures every
//! scoring function needs: a vocabulary mapping terms to dense indices,
//! per-term postings with term frequencies, per-document lengths, and the
//! average document length. A built index is immutable; rebuilding produces
//! a fresh value that owners publish behind an `Arc`, so concurrent readers
//! never observe a partially built index.

use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::corpus::TokenCorpus;
use crate::error::{Result, SagittaError};

/// One posting: a document containing the term, with its term frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Dense index of the document in corpus order.
    pub doc: u32,

    /// Number of occurrences of the term in that document.
    pub term_freq: u32,
}

/// Statistics about a built index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of documents in the index.
    pub doc_count: usize,

    /// Number of distinct terms in the vocabulary.
    pub term_count: usize,

    /// Average document length in tokens.
    pub avg_doc_length: f64,
}

/// A built lexical index over one corpus version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalIndex {
    /// Document ids in corpus order; shared with score vectors.
    doc_ids: Arc<[String]>,

    /// Term to dense vocabulary index.
    vocabulary: AHashMap<String, u32>,

    /// Postings per vocabulary index, each sorted by document index.
    postings: Vec<Vec<Posting>>,

    /// Token count per document, in corpus order.
    doc_lengths: Vec<u32>,

    /// Average document length in tokens.
    avg_doc_length: f64,
}

impl LexicalIndex {
    /// Build an index from a token corpus.
    ///
    /// Fails with [`SagittaError::EmptyCorpus`] when the corpus has zero
    /// documents. The vocabulary index assigned to each term is stable for
    /// the lifetime of the returned value; a rebuild may reassign indices.
    pub fn build(corpus: &TokenCorpus) -> Result<LexicalIndex> {
        if corpus.is_empty() {
            return Err(SagittaError::empty_corpus(
                "cannot build an index over zero documents",
            ));
        }

        let mut doc_ids = Vec::with_capacity(corpus.len());
        let mut vocabulary: AHashMap<String, u32> = AHashMap::new();
        let mut postings: Vec<Vec<Posting>> = Vec::new();
        let mut doc_lengths = Vec::with_capacity(corpus.len());
        let mut total_tokens: u64 = 0;

        for (doc, tokenized) in corpus.iter().enumerate() {
            doc_ids.push(tokenized.doc_id.clone());
            doc_lengths.push(tokenized.tokens.len() as u32);
            total_tokens += tokenized.tokens.len() as u64;

            let mut freqs: AHashMap<&str, u32> = AHashMap::new();
            for token in &tokenized.tokens {
                *freqs.entry(token.as_str()).or_insert(0) += 1;
            }

            for (term, term_freq) in freqs {
                let term_index = match vocabulary.get(term) {
                    Some(&index) => index,
                    None => {
                        let index = postings.len() as u32;
                        vocabulary.insert(term.to_string(), index);
                        postings.push(Vec::new());
                        index
                    }
                };
                postings[term_index as usize].push(Posting {
                    doc: doc as u32,
                    term_freq,
                });
            }
        }

        // Documents are visited in corpus order, but per-document term
        // iteration is unordered, so each postings list still needs sorting.
        for list in &mut postings {
            list.sort_unstable_by_key(|p| p.doc);
        }

        let avg_doc_length = total_tokens as f64 / corpus.len() as f64;

        Ok(LexicalIndex {
            doc_ids: doc_ids.into(),
            vocabulary,
            postings,
            doc_lengths,
            avg_doc_length,
        })
    }

    /// Number of documents in the index.
    pub fn doc_count(&self) -> usize {
        self.doc_ids.len()
    }

    /// Number of distinct terms in the vocabulary.
    pub fn term_count(&self) -> usize {
        self.vocabulary.len()
    }

    /// Document ids in corpus order.
    pub fn doc_ids(&self) -> &Arc<[String]> {
        &self.doc_ids
    }

    /// Token count of the document at `doc` (corpus order index).
    pub fn doc_length(&self, doc: u32) -> u32 {
        self.doc_lengths[doc as usize]
    }

    /// Average document length in tokens.
    pub fn avg_doc_length(&self) -> f64 {
        self.avg_doc_length
    }

    /// Dense vocabulary index of `term`, if the corpus contains it.
    pub fn term_index(&self, term: &str) -> Option<u32> {
        self.vocabulary.get(term).copied()
    }

    /// Postings for the term at `term_index`.
    pub fn postings(&self, term_index: u32) -> &[Posting] {
        &self.postings[term_index as usize]
    }

    /// Number of documents containing `term`; 0 for unseen terms.
    pub fn document_frequency(&self, term: &str) -> u64 {
        self.vocabulary
            .get(term)
            .map(|&index| self.postings[index as usize].len() as u64)
            .unwrap_or(0)
    }

    /// Statistics about this index.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            doc_count: self.doc_count(),
            term_count: self.term_count(),
            avg_doc_length: self.avg_doc_length,
        }
    }
}
