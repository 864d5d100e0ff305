//! TF-IDF vectorizer
//!
//! Term weights are raw counts times the smoothed inverse document frequency
//! `ln((1 + n) / (1 + df)) + 1`, and every row is scaled to unit L2 norm.
//! Vocabulary indices follow the sorted term order, so fitting is
//! deterministic regardless of hash map iteration order.

use crate::core::{Result, SparseVector, StackSampleError};
use crate::text::Tokenizer;
use std::collections::{BTreeMap, HashMap};

/// Bag-of-words vectorizer with TF-IDF weighting
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    tokenizer: Tokenizer,
    /// Minimum number of documents a term must appear in
    min_df: usize,
    /// Maximum share of documents a term may appear in
    max_df: f64,
    /// Keep only the most frequent terms
    max_features: Option<usize>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            min_df: 1,
            max_df: 1.0,
            max_features: None,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    pub fn with_max_df(mut self, max_df: f64) -> Self {
        self.max_df = max_df;
        self
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Learn the vocabulary and idf weights from a corpus
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(StackSampleError::InvalidParameter(format!(
                "max_df must be in (0, 1], got: {}",
                self.max_df
            )));
        }

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut term_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for token in self.tokenizer.tokenize(doc.as_ref()) {
                *counts.entry(token).or_insert(0) += 1;
            }
            for (term, count) in counts {
                *term_freq.entry(term.clone()).or_insert(0) += count;
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n_docs = documents.len();
        let max_count = self.max_df * n_docs as f64;
        let mut terms: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.min_df && *df as f64 <= max_count)
            .collect();

        if let Some(limit) = self.max_features {
            terms.sort_by(|a, b| term_freq[&b.0].cmp(&term_freq[&a.0]).then(a.0.cmp(&b.0)));
            terms.truncate(limit);
        }
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        if terms.is_empty() {
            return Err(StackSampleError::InvalidDataset(
                "empty vocabulary; the documents contain no usable terms".to_string(),
            ));
        }

        self.vocabulary.clear();
        self.idf.clear();
        for (idx, (term, df)) in terms.into_iter().enumerate() {
            let idf = ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0;
            self.vocabulary.insert(term, idx);
            self.idf.push(idf);
        }

        Ok(())
    }

    /// Vectorize one document with the fitted vocabulary
    ///
    /// Terms outside the vocabulary are ignored; a document with no known
    /// terms maps to the empty vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in self.tokenizer.tokenize(document) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let (indices, mut values): (Vec<usize>, Vec<f64>) = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .unzip();

        let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }

        SparseVector::new(indices, values)
    }

    /// Vectorize many documents
    pub fn transform_batch<S: AsRef<str>>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents.iter().map(|d| self.transform(d.as_ref())).collect()
    }

    /// Fit on a corpus and vectorize it
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        Ok(self.transform_batch(documents))
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Fitted idf weight of a term
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&idx| self.idf[idx])
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}
