//! Topic-frequency analytics over the interaction log.
//!
//! Topics are pulled from each prompt by a [`TopicExtractor`], counted
//! (at most once per interaction per topic), sorted by count, and split at
//! `ceil(n / 2)` into strengths and gaps.
//!
//! Ties are broken by the extractor's [`TopicExtractor::rank`] (lexicon
//! order for [`KeywordTopicExtractor`]), then alphabetically.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::models::{AnalyticsReport, Interaction};

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "algebra",
    "calculus",
    "geometry",
    "trigonometry",
    "statistics",
    "probability",
];

/// Pulls topic labels out of free text.
pub trait TopicExtractor: Send + Sync {
    /// Topics mentioned in `text`. Duplicates are ignored by the caller.
    fn extract(&self, text: &str) -> Vec<String>;

    /// Tie-break position for `topic`; lower sorts first. `None` sorts last.
    fn rank(&self, _topic: &str) -> Option<usize> {
        None
    }
}

/// Case-insensitive substring match against a fixed lexicon.
#[derive(Debug, Clone)]
pub struct KeywordTopicExtractor {
    keywords: Vec<String>,
}

impl KeywordTopicExtractor {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        }
    }
}

impl Default for KeywordTopicExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }
}

impl TopicExtractor for KeywordTopicExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .cloned()
            .collect()
    }

    fn rank(&self, topic: &str) -> Option<usize> {
        self.keywords.iter().position(|k| k == topic)
    }
}

const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "between", "both", "could", "does",
    "doing", "each", "explain", "from", "have", "having", "into", "just", "know", "more", "most",
    "much", "need", "only", "other", "over", "same", "should", "some", "such", "than", "that",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "very", "want",
    "were", "what", "when", "where", "which", "while", "will", "with", "would", "your",
];

/// Statistical extractor: the most frequent content words of a prompt.
///
/// Words are lowercase alphanumeric runs of at least four characters that
/// are not stop words. Ties within a prompt go to the earlier word.
#[derive(Debug, Clone)]
pub struct FrequencyTopicExtractor {
    max_topics: usize,
}

impl FrequencyTopicExtractor {
    pub fn new(max_topics: usize) -> Self {
        Self {
            max_topics: max_topics.max(1),
        }
    }
}

impl TopicExtractor for FrequencyTopicExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut counts: Vec<(String, usize)> = Vec::new();
        for word in lower.split(|c: char| !c.is_alphanumeric()) {
            if word.chars().count() < 4 || STOP_WORDS.contains(&word) {
                continue;
            }
            match counts.iter_mut().find(|(w, _)| w == word) {
                Some((_, n)) => *n += 1,
                None => counts.push((word.to_string(), 1)),
            }
        }
        // stable sort keeps first-occurrence order among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .take(self.max_topics)
            .map(|(w, _)| w)
            .collect()
    }
}

/// Aggregate topic counts and split them into strengths and gaps.
pub fn analyze(interactions: &[Interaction], extractor: &dyn TopicExtractor) -> AnalyticsReport {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for interaction in interactions {
        let mut topics = extractor.extract(&interaction.prompt);
        topics.sort();
        topics.dedup();
        for topic in topics {
            *counts.entry(topic).or_insert(0) += 1;
        }
    }

    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|(a, ac), (b, bc)| {
        bc.cmp(ac)
            .then_with(|| compare_rank(extractor.rank(a), extractor.rank(b)))
            .then_with(|| a.cmp(b))
    });

    let half = sorted.len().div_ceil(2);
    let strengths = sorted[..half].iter().map(|(t, _)| t.clone()).collect();
    let gaps = sorted[half..].iter().map(|(t, _)| t.clone()).collect();

    AnalyticsReport {
        topic_count: sorted.into_iter().collect::<BTreeMap<_, _>>(),
        strengths,
        gaps,
    }
}

fn compare_rank(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
