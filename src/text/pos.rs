//! Rule-based part-of-speech tagging with Penn Treebank labels.
//!
//! Closed-class words come from fixed tables; open-class words are decided
//! by dictionary word classes when the lexicon knows them, otherwise by
//! capitalization and suffix rules.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::text::lexicon::{Lexicon, WordClasses};
use crate::text::tokenize::{is_punctuation, is_sentence_end};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Noun,
    PluralNoun,
    ProperNoun,
    Adjective,
    Comparative,
    Superlative,
    Verb,
    VerbPast,
    VerbGerund,
    VerbParticiple,
    VerbPresent,
    Adverb,
    Determiner,
    Preposition,
    Pronoun,
    PossessivePronoun,
    Conjunction,
    Modal,
    Number,
    To,
    WhWord,
    Possessive,
    Punctuation,
}

impl Tag {
    pub fn penn(self) -> &'static str {
        match self {
            Self::Noun => "NN",
            Self::PluralNoun => "NNS",
            Self::ProperNoun => "NNP",
            Self::Adjective => "JJ",
            Self::Comparative => "JJR",
            Self::Superlative => "JJS",
            Self::Verb => "VB",
            Self::VerbPast => "VBD",
            Self::VerbGerund => "VBG",
            Self::VerbParticiple => "VBN",
            Self::VerbPresent => "VBZ",
            Self::Adverb => "RB",
            Self::Determiner => "DT",
            Self::Preposition => "IN",
            Self::Pronoun => "PRP",
            Self::PossessivePronoun => "PRP$",
            Self::Conjunction => "CC",
            Self::Modal => "MD",
            Self::Number => "CD",
            Self::To => "TO",
            Self::WhWord => "WRB",
            Self::Possessive => "POS",
            Self::Punctuation => ".",
        }
    }

    /// Common nouns (singular or plural) and every adjective degree.
    pub fn is_noun_or_adjective(self) -> bool {
        matches!(
            self,
            Self::Noun | Self::PluralNoun | Self::Adjective | Self::Comparative | Self::Superlative
        )
    }
}

pub trait PosTagger: Send + Sync {
    fn tag(&self, tokens: &[String]) -> Vec<Tag>;
}

static CLOSED_CLASS: Lazy<HashMap<&'static str, Tag>> = Lazy::new(|| {
    let mut table = HashMap::new();
    let groups: [(&[&str], Tag); 12] = [
        (
            &[
                "the", "a", "an", "this", "that", "these", "those", "each", "every", "some",
                "any", "no", "all", "both", "either", "neither", "another", "such",
            ],
            Tag::Determiner,
        ),
        (
            &[
                "of", "in", "on", "at", "by", "for", "with", "from", "into", "onto", "upon",
                "about", "above", "below", "behind", "beneath", "beside", "between", "beyond",
                "through", "throughout", "across", "against", "along", "among", "around",
                "during", "except", "inside", "outside", "over", "under", "until", "toward",
                "towards", "via", "within", "without", "after", "before", "since", "like",
                "near", "off", "past", "per", "than", "as", "if", "while", "because",
                "although", "though", "whether", "unless",
            ],
            Tag::Preposition,
        ),
        (&["and", "or", "but", "nor", "yet", "so", "plus"], Tag::Conjunction),
        (
            &[
                "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them",
                "myself", "yourself", "himself", "herself", "itself", "ourselves",
                "themselves", "who", "whom", "one", "everyone", "someone", "anyone",
                "nothing", "something", "everything",
            ],
            Tag::Pronoun,
        ),
        (
            &["my", "your", "his", "her", "its", "our", "their", "whose"],
            Tag::PossessivePronoun,
        ),
        (
            &[
                "can", "could", "may", "might", "must", "shall", "should", "will", "would",
            ],
            Tag::Modal,
        ),
        (&["be", "have", "do"], Tag::Verb),
        (&["is", "has", "does"], Tag::VerbPresent),
        (&["am", "are"], Tag::VerbPresent),
        (&["was", "were", "had", "did"], Tag::VerbPast),
        (&["been", "done"], Tag::VerbParticiple),
        (
            &[
                "not", "very", "too", "also", "just", "only", "even", "still", "already",
                "again", "ever", "never", "always", "often", "here", "there", "now", "then",
                "alike", "together", "away", "back", "soon", "once", "forever", "almost",
            ],
            Tag::Adverb,
        ),
    ];
    for (words, tag) in groups {
        for word in words {
            table.insert(*word, tag);
        }
    }
    table.insert("being", Tag::VerbGerund);
    for (clitic, tag) in [
        ("'s", Tag::Possessive),
        ("n't", Tag::Adverb),
        ("'m", Tag::VerbPresent),
        ("'re", Tag::VerbPresent),
        ("'ve", Tag::Verb),
        ("'ll", Tag::Modal),
        ("'d", Tag::Modal),
    ] {
        table.insert(clitic, tag);
    }
    table.insert("to", Tag::To);
    for word in ["when", "where", "why", "how", "what", "which"] {
        table.insert(word, Tag::WhWord);
    }
    table
});

const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ous", "ful", "less", "ive", "able", "ible", "ical", "ic", "ish", "ary", "al",
];

pub struct RuleTagger {
    lexicon: Arc<dyn Lexicon>,
}

impl RuleTagger {
    pub fn new(lexicon: Arc<dyn Lexicon>) -> Self {
        RuleTagger { lexicon }
    }

    fn is_numeric(token: &str) -> bool {
        token.chars().any(|ch| ch.is_ascii_digit())
            && token
                .chars()
                .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | ',' | '-' | '/'))
    }

    fn noun_for(lower: &str) -> Tag {
        if lower.len() > 3 && lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us")
        {
            Tag::PluralNoun
        } else {
            Tag::Noun
        }
    }

    fn verb_for(lower: &str) -> Tag {
        if lower.ends_with("ing") {
            Tag::VerbGerund
        } else if lower.ends_with("ed") {
            Tag::VerbPast
        } else if lower.ends_with('s') && !lower.ends_with("ss") {
            Tag::VerbPresent
        } else {
            Tag::Verb
        }
    }

    fn adjective_for(lower: &str, classes: WordClasses) -> Tag {
        // Only inflected forms whose stem is the dictionary adjective get a degree.
        if !classes.adjective {
            return Tag::Adjective;
        }
        if lower.len() > 5 && lower.ends_with("est") {
            Tag::Superlative
        } else if lower.len() > 4 && lower.ends_with("er") {
            Tag::Comparative
        } else {
            Tag::Adjective
        }
    }

    fn next_can_be_noun(&self, next: Option<&String>) -> bool {
        let Some(next) = next else {
            return false;
        };
        if is_punctuation(next) || CLOSED_CLASS.contains_key(next.to_lowercase().as_str()) {
            return false;
        }
        let classes = self.lexicon.word_classes(next);
        classes.is_empty() || classes.noun
    }

    fn tag_with_classes(
        &self,
        lower: &str,
        classes: WordClasses,
        previous: Option<Tag>,
        next: Option<&String>,
    ) -> Tag {
        let after_verb_marker = matches!(previous, Some(Tag::To) | Some(Tag::Modal));
        if after_verb_marker && classes.verb {
            return Tag::Verb;
        }

        if classes.adjective && classes.noun {
            // An adjective reading wins only in front of something noun-like.
            return if self.next_can_be_noun(next) {
                Self::adjective_for(lower, classes)
            } else {
                Self::noun_for(lower)
            };
        }
        if classes.noun {
            let determiner_before = matches!(
                previous,
                Some(Tag::Determiner) | Some(Tag::PossessivePronoun) | Some(Tag::Adjective)
            );
            if classes.verb && !determiner_before && matches!(previous, Some(Tag::Pronoun)) {
                return Self::verb_for(lower);
            }
            return Self::noun_for(lower);
        }
        if classes.adjective {
            return Self::adjective_for(lower, classes);
        }
        if classes.verb {
            if lower.ends_with("ing") && self.next_can_be_noun(next) {
                return Tag::Adjective;
            }
            return Self::verb_for(lower);
        }
        Tag::Adverb
    }

    fn tag_by_shape(&self, lower: &str, previous: Option<Tag>, next: Option<&String>) -> Tag {
        if matches!(previous, Some(Tag::To) | Some(Tag::Modal)) {
            return Tag::Verb;
        }
        if lower.contains('-') {
            return Tag::Adjective;
        }
        if lower.len() > 4 && lower.ends_with("ly") {
            return Tag::Adverb;
        }
        if ADJECTIVE_SUFFIXES
            .iter()
            .any(|suffix| lower.len() > suffix.len() + 2 && lower.ends_with(suffix))
        {
            return Tag::Adjective;
        }
        if lower.len() > 5 && lower.ends_with("ing") {
            return if self.next_can_be_noun(next) {
                Tag::Adjective
            } else {
                Tag::VerbGerund
            };
        }
        if lower.len() > 4 && lower.ends_with("ed") {
            return Tag::VerbParticiple;
        }
        Self::noun_for(lower)
    }
}

impl PosTagger for RuleTagger {
    fn tag(&self, tokens: &[String]) -> Vec<Tag> {
        let mut tags: Vec<Tag> = Vec::with_capacity(tokens.len());
        for (index, token) in tokens.iter().enumerate() {
            let previous = tags.last().copied();
            let next = tokens.get(index + 1);
            let sentence_start = index == 0 || is_sentence_end(&tokens[index - 1]);

            let tag = if is_punctuation(token) {
                Tag::Punctuation
            } else if Self::is_numeric(token) {
                Tag::Number
            } else {
                let lower = token.to_lowercase().replace('’', "'");
                if let Some(tag) = CLOSED_CLASS.get(lower.as_str()) {
                    *tag
                } else if !sentence_start
                    && token.chars().next().is_some_and(char::is_uppercase)
                {
                    Tag::ProperNoun
                } else {
                    let classes = self.lexicon.word_classes(&lower);
                    if classes.is_empty() {
                        if sentence_start && token.chars().next().is_some_and(char::is_uppercase)
                        {
                            // Unknown capitalized opener: most likely a name.
                            let known = self.lexicon.sense_count(&lower) > 0;
                            if known {
                                self.tag_by_shape(&lower, previous, next)
                            } else {
                                Tag::ProperNoun
                            }
                        } else {
                            self.tag_by_shape(&lower, previous, next)
                        }
                    } else {
                        self.tag_with_classes(&lower, classes, previous, next)
                    }
                }
            };
            tags.push(tag);
        }
        tags
    }
}
