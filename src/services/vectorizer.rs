//! Bag-of-words vectorization of tag text.
//!
//! Terms are lowercase runs of two or more alphanumeric characters. English
//! stop words are dropped and the vocabulary keeps the most frequent terms
//! across the whole corpus, ties broken alphabetically.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{AppError, AppResult};

/// Default vocabulary cap
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// English stop words, same list scikit-learn ships
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone",
    "anything", "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became",
    "because", "become", "becomes", "becoming", "been", "before", "beforehand", "behind",
    "being", "below", "beside", "besides", "between", "beyond", "bill", "both", "bottom",
    "but", "by", "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "cry",
    "de", "describe", "detail", "do", "done", "down", "due", "during", "each", "eg",
    "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even",
    "ever", "every", "everyone", "everything", "everywhere", "except", "few", "fifteen",
    "fifty", "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty",
    "found", "four", "from", "front", "full", "further", "get", "give", "go", "had", "has",
    "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
    "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred",
    "i", "ie", "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its", "itself",
    "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may",
    "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly",
    "move", "much", "must", "my", "myself", "name", "namely", "neither", "never",
    "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem",
    "seemed", "seeming", "seems", "serious", "several", "she", "should", "show", "side",
    "since", "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than",
    "that", "the", "their", "them", "themselves", "then", "thence", "there", "thereafter",
    "thereby", "therefore", "therein", "thereupon", "these", "they", "thick", "thin",
    "third", "this", "those", "though", "three", "through", "throughout", "thru", "thus",
    "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
    "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
    "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while", "whither",
    "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without",
    "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

/// Sparse term-count vector, sorted by term index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
    entries: Vec<(usize, f64)>,
}

impl TermVector {
    fn from_counts(counts: BTreeMap<usize, u32>) -> Self {
        Self {
            entries: counts.into_iter().map(|(i, c)| (i, f64::from(c))).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count stored for a term index
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// Dot product by merging both sorted entry lists
    pub fn dot(&self, other: &TermVector) -> f64 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Count vectorizer fitted on one catalog snapshot
#[derive(Debug, Clone)]
pub struct TagVectorizer {
    max_features: usize,
    stop_words: HashSet<&'static str>,
    vocabulary: HashMap<String, usize>,
}

impl Default for TagVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl TagVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features: max_features.max(1),
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
            vocabulary: HashMap::new(),
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Index of a term in the fitted vocabulary
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    fn tokenize<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| t.chars().count() >= 2)
            .map(str::to_lowercase)
            .filter(move |t| !self.stop_words.contains(t.as_str()))
    }

    /// Learns the vocabulary from `documents`
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> AppResult<()> {
        if documents.is_empty() {
            return Err(AppError::EmptyCatalog);
        }

        let mut term_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            for term in self.tokenize(doc.as_ref()) {
                *term_freq.entry(term).or_insert(0) += 1;
            }
        }
        if term_freq.is_empty() {
            return Err(AppError::EmptyVocabulary);
        }

        let mut ranked: Vec<(String, usize)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        // Indices follow alphabetical order of the kept terms
        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();
        self.vocabulary = terms.into_iter().enumerate().map(|(i, t)| (t, i)).collect();

        tracing::debug!(
            documents = documents.len(),
            vocabulary = self.vocabulary.len(),
            "Fitted tag vocabulary"
        );
        Ok(())
    }

    /// Maps documents onto the fitted vocabulary
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> AppResult<Vec<TermVector>> {
        if self.vocabulary.is_empty() {
            return Err(AppError::EmptyVocabulary);
        }

        Ok(documents
            .iter()
            .map(|doc| {
                let mut counts = BTreeMap::new();
                for term in self.tokenize(doc.as_ref()) {
                    if let Some(&index) = self.vocabulary.get(&term) {
                        *counts.entry(index).or_insert(0u32) += 1;
                    }
                }
                TermVector::from_counts(counts)
            })
            .collect())
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> AppResult<Vec<TermVector>> {
        self.fit(documents)?;
        self.transform(documents)
    }
}
