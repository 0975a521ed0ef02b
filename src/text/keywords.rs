use std::sync::Arc;

use crate::text::lexicon::Lexicon;
use crate::text::pos::{PosTagger, RuleTagger};
use crate::text::tokenize::word_tokenize;

/// Summary keywords kept per game, first ones in document order.
pub const SUMMARY_KEYWORD_LIMIT: usize = 5;

/// Tokens containing any of these (case-sensitive substring) are dropped.
pub const FILTER_WORDS: [&str; 2] = ["game", "play"];

pub struct KeywordExtractor {
    tagger: Box<dyn PosTagger>,
    lexicon: Arc<dyn Lexicon>,
    limit: usize,
}

impl KeywordExtractor {
    pub fn new(lexicon: Arc<dyn Lexicon>) -> Self {
        let tagger = Box::new(RuleTagger::new(lexicon.clone()));
        Self::with_tagger(tagger, lexicon)
    }

    pub fn with_tagger(tagger: Box<dyn PosTagger>, lexicon: Arc<dyn Lexicon>) -> Self {
        KeywordExtractor {
            tagger,
            lexicon,
            limit: SUMMARY_KEYWORD_LIMIT,
        }
    }

    /// Nouns and adjectives of `summary` that have at least one dictionary
    /// sense and none of the filter words, capped at the keyword limit.
    pub fn summary_keywords(&self, summary: &str) -> Vec<String> {
        let tokens = word_tokenize(summary);
        let tags = self.tagger.tag(&tokens);
        tokens
            .into_iter()
            .zip(tags)
            .filter(|(_, tag)| tag.is_noun_or_adjective())
            .filter(|(word, _)| !FILTER_WORDS.iter().any(|filter| word.contains(filter)))
            .filter(|(word, _)| self.lexicon.sense_count(word) > 0)
            .map(|(word, _)| word)
            .take(self.limit)
            .collect()
    }
}
