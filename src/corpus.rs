//! Corpus, query, and relevance-judgment snapshots.
//!
//! These are the three read-only tables the ranking engine consumes:
//! documents keyed by `doc_id`, queries keyed by `query_id`, and qrels keyed
//! by `(query_id, doc_id)`. Document order within a [`Corpus`] defines the
//! corpus order used as the stable tie-break when ranking.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::OnceLock;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SagittaError};

/// A single document in the collection.
///
/// Any JSON fields beyond `doc_id` and `text` are captured in `extra` and
/// carried through to search responses (numeric extras are filtered out at
/// response time, matching the snapshot contract of returning only
/// non-numeric document fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable unique document identifier.
    pub doc_id: String,

    /// Raw document text.
    pub text: String,

    /// Additional document fields, preserved as-is.
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, Value>,
}

impl Document {
    /// Create a document with no extra fields.
    pub fn new<S: Into<String>, T: Into<String>>(doc_id: S, text: T) -> Self {
        Document {
            doc_id: doc_id.into(),
            text: text.into(),
            extra: BTreeMap::new(),
        }
    }

    /// The non-numeric fields of this document, for search responses.
    pub fn display_fields(&self) -> BTreeMap<String, Value> {
        let mut fields = BTreeMap::new();
        fields.insert("text".to_string(), Value::String(self.text.clone()));
        for (name, value) in &self.extra {
            if !value.is_number() {
                fields.insert(name.clone(), value.clone());
            }
        }
        fields
    }
}

/// A natural-language query with a stable identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Stable unique query identifier.
    pub query_id: String,

    /// Raw query text.
    pub text: String,
}

impl Query {
    /// Create a new query.
    pub fn new<S: Into<String>, T: Into<String>>(query_id: S, text: T) -> Self {
        Query {
            query_id: query_id.into(),
            text: text.into(),
        }
    }
}

/// A relevance judgment (qrel): `doc_id` is relevant to `query_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    /// The judged query.
    pub query_id: String,

    /// The document judged relevant to it.
    pub doc_id: String,
}

/// An ordered, immutable document collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Create a corpus from documents, preserving their order.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Corpus { documents }
    }

    /// Load a corpus from a JSON file holding an array of documents.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let documents: Vec<Document> = serde_json::from_str(&data)?;
        Ok(Corpus { documents })
    }

    /// Number of documents in the corpus.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus has no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate over documents in corpus order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    /// The documents in corpus order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Look up a document by id. Linear scan; the corpus is small by design.
    pub fn get(&self, doc_id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.doc_id == doc_id)
    }
}

/// One document's normalized token sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizedDoc {
    /// The document this token sequence came from.
    pub doc_id: String,

    /// Ordered normalized tokens, duplicates preserved.
    pub tokens: Vec<String>,
}

/// The preprocessor's output for a whole corpus: ordered `(doc_id, tokens)`
/// pairs, in corpus order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenCorpus {
    docs: Vec<TokenizedDoc>,
}

impl TokenCorpus {
    /// Create an empty token corpus.
    pub fn new() -> Self {
        TokenCorpus { docs: Vec::new() }
    }

    /// Append one document's token sequence.
    pub fn push<S: Into<String>>(&mut self, doc_id: S, tokens: Vec<String>) {
        self.docs.push(TokenizedDoc {
            doc_id: doc_id.into(),
            tokens,
        });
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the token corpus has no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Iterate over tokenized documents in corpus order.
    pub fn iter(&self) -> std::slice::Iter<'_, TokenizedDoc> {
        self.docs.iter()
    }
}

/// An ordered set of queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuerySet {
    queries: Vec<Query>,
}

impl QuerySet {
    /// Create a query set from queries, preserving their order.
    pub fn from_queries(queries: Vec<Query>) -> Self {
        QuerySet { queries }
    }

    /// Load a query set from a JSON file holding an array of queries.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let queries: Vec<Query> = serde_json::from_str(&data)?;
        Ok(QuerySet { queries })
    }

    /// Number of queries.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the set has no queries.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Iterate over queries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Query> {
        self.queries.iter()
    }

    /// The queries in order.
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }
}

/// The relevance judgments for a query/corpus pair, indexed by query id.
#[derive(Debug, Clone, Default)]
pub struct JudgmentSet {
    relevant: AHashMap<String, AHashSet<String>>,
    fingerprint: u64,
}

fn empty_doc_set() -> &'static AHashSet<String> {
    static EMPTY: OnceLock<AHashSet<String>> = OnceLock::new();
    EMPTY.get_or_init(AHashSet::new)
}

impl JudgmentSet {
    /// Build a judgment set from individual qrels.
    pub fn from_judgments(judgments: &[Judgment]) -> Self {
        let mut relevant: AHashMap<String, AHashSet<String>> = AHashMap::new();
        for judgment in judgments {
            relevant
                .entry(judgment.query_id.clone())
                .or_default()
                .insert(judgment.doc_id.clone());
        }

        let fingerprint = Self::compute_fingerprint(&relevant);
        JudgmentSet {
            relevant,
            fingerprint,
        }
    }

    /// Load a judgment set from a JSON file holding an array of qrels.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let judgments: Vec<Judgment> = serde_json::from_str(&data)?;
        Ok(Self::from_judgments(&judgments))
    }

    /// The set of doc ids judged relevant to `query_id`.
    ///
    /// A query with no judgments yields the empty set, not an error.
    pub fn relevant_docs(&self, query_id: &str) -> &AHashSet<String> {
        self.relevant.get(query_id).unwrap_or_else(|| empty_doc_set())
    }

    /// Whether `doc_id` is judged relevant to `query_id`.
    pub fn is_relevant(&self, query_id: &str, doc_id: &str) -> bool {
        self.relevant
            .get(query_id)
            .is_some_and(|docs| docs.contains(doc_id))
    }

    /// Number of queries with at least one judgment.
    pub fn query_count(&self) -> usize {
        self.relevant.len()
    }

    /// Order-independent fingerprint used for evaluation-cache keys.
    ///
    /// Two judgment sets with the same qrels have the same fingerprint
    /// regardless of construction order.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    fn compute_fingerprint(relevant: &AHashMap<String, AHashSet<String>>) -> u64 {
        let mut pairs: Vec<(&str, &str)> = relevant
            .iter()
            .flat_map(|(query_id, docs)| {
                docs.iter().map(move |doc_id| (query_id.as_str(), doc_id.as_str()))
            })
            .collect();
        pairs.sort_unstable();

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for pair in &pairs {
            pair.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Verify that every judged doc id exists in the corpus snapshot.
    pub fn validate_against(&self, corpus: &Corpus) -> Result<()> {
        let known: AHashSet<&str> = corpus.iter().map(|d| d.doc_id.as_str()).collect();
        for (query_id, docs) in &self.relevant {
            for doc_id in docs {
                if !known.contains(doc_id.as_str()) {
                    return Err(SagittaError::invalid_argument(format!(
                        "judgment for query '{query_id}' references unknown doc '{doc_id}'"
                    )));
                }
            }
        }
        Ok(())
    }
}
