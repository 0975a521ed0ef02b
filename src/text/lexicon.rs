//! Lexical-relevance lookups backed by the WordNet database files.
//!
//! Only the `index.*` files (lemma → synset count) and the optional `*.exc`
//! exception lists are read; glosses and pointers are never loaded.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordClass {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl WordClass {
    pub const ALL: [WordClass; 4] = [
        WordClass::Noun,
        WordClass::Verb,
        WordClass::Adjective,
        WordClass::Adverb,
    ];

    fn index(self) -> usize {
        match self {
            Self::Noun => 0,
            Self::Verb => 1,
            Self::Adjective => 2,
            Self::Adverb => 3,
        }
    }

    fn file_suffix(self) -> &'static str {
        match self {
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adj",
            Self::Adverb => "adv",
        }
    }

    // Inflectional endings stripped before lookup, as (suffix, replacement).
    fn detachments(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Noun => &[
                ("s", ""),
                ("ses", "s"),
                ("xes", "x"),
                ("zes", "z"),
                ("ches", "ch"),
                ("shes", "sh"),
                ("men", "man"),
                ("ies", "y"),
            ],
            Self::Verb => &[
                ("s", ""),
                ("ies", "y"),
                ("es", "e"),
                ("es", ""),
                ("ed", "e"),
                ("ed", ""),
                ("ing", "e"),
                ("ing", ""),
            ],
            Self::Adjective => &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")],
            Self::Adverb => &[],
        }
    }
}

/// Which word classes a lemma is listed under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordClasses {
    pub noun: bool,
    pub verb: bool,
    pub adjective: bool,
    pub adverb: bool,
}

impl WordClasses {
    pub fn is_empty(&self) -> bool {
        !(self.noun || self.verb || self.adjective || self.adverb)
    }

    fn set(&mut self, class: WordClass) {
        match class {
            WordClass::Noun => self.noun = true,
            WordClass::Verb => self.verb = true,
            WordClass::Adjective => self.adjective = true,
            WordClass::Adverb => self.adverb = true,
        }
    }
}

pub trait Lexicon: Send + Sync {
    /// Number of dictionary senses known for `word` in any word class.
    fn sense_count(&self, word: &str) -> usize;

    /// Word classes `word` is listed under; empty when unknown.
    fn word_classes(&self, _word: &str) -> WordClasses {
        WordClasses::default()
    }
}

#[derive(Debug, Default)]
pub struct WordNetLexicon {
    // lemma -> synset count per word class (noun, verb, adj, adv)
    senses: HashMap<String, [usize; 4]>,
    exceptions: HashMap<(WordClass, String), Vec<String>>,
}

impl WordNetLexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `index.{noun,verb,adj,adv}` and, when present, `{noun,verb,adj,adv}.exc`.
    pub fn load_dir(dir: &Path) -> io::Result<Self> {
        let mut lexicon = Self::new();
        for class in WordClass::ALL {
            let index_path = dir.join(format!("index.{}", class.file_suffix()));
            let raw = fs::read_to_string(&index_path)?;
            lexicon.add_index(class, &raw);

            let exc_path = dir.join(format!("{}.exc", class.file_suffix()));
            match fs::read_to_string(&exc_path) {
                Ok(raw) => lexicon.add_exceptions(class, &raw),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    debug!("No exception list at {}", exc_path.display());
                }
                Err(err) => return Err(err),
            }
        }
        info!(
            "Loaded {} WordNet lemmas from {}",
            lexicon.senses.len(),
            dir.display()
        );
        Ok(lexicon)
    }

    /// Parses index lines: `lemma pos synset_cnt p_cnt [ptr...] sense_cnt tagsense_cnt offsets...`.
    /// License header lines start with a space and are skipped.
    pub fn add_index(&mut self, class: WordClass, raw: &str) {
        for line in raw.lines() {
            if line.starts_with(' ') || line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(lemma), Some(_pos), Some(count)) = (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            let Ok(count) = count.parse::<usize>() else {
                continue;
            };
            let entry = self.senses.entry(lemma.to_lowercase()).or_insert([0; 4]);
            entry[class.index()] += count;
        }
    }

    /// Parses exception lines: `inflected base [base...]`.
    pub fn add_exceptions(&mut self, class: WordClass, raw: &str) {
        for line in raw.lines() {
            let mut fields = line.split_whitespace();
            let Some(inflected) = fields.next() else {
                continue;
            };
            let bases: Vec<String> = fields.map(str::to_lowercase).collect();
            if bases.is_empty() {
                continue;
            }
            self.exceptions
                .entry((class, inflected.to_lowercase()))
                .or_default()
                .extend(bases);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }

    fn count_for(&self, lemma: &str, class: WordClass) -> usize {
        self.senses
            .get(lemma)
            .map(|counts| counts[class.index()])
            .unwrap_or(0)
    }

    /// Candidate lemmas of `form` in `class` that exist in the index.
    fn base_forms(&self, form: &str, class: WordClass) -> Vec<String> {
        let mut candidates: Vec<String> = vec![form.to_string()];
        if let Some(bases) = self.exceptions.get(&(class, form.to_string())) {
            candidates.extend(bases.iter().cloned());
        }
        for (suffix, replacement) in class.detachments() {
            if let Some(stem) = form.strip_suffix(suffix) {
                if !stem.is_empty() {
                    candidates.push(format!("{stem}{replacement}"));
                }
            }
        }

        let mut found: Vec<String> = Vec::new();
        for candidate in candidates {
            if self.count_for(&candidate, class) > 0 && !found.contains(&candidate) {
                found.push(candidate);
            }
        }
        found
    }
}

fn normalize_lookup(word: &str) -> String {
    word.trim().to_lowercase().replace(' ', "_")
}

impl Lexicon for WordNetLexicon {
    fn sense_count(&self, word: &str) -> usize {
        let form = normalize_lookup(word);
        if form.is_empty() {
            return 0;
        }
        WordClass::ALL
            .into_iter()
            .flat_map(|class| {
                self.base_forms(&form, class)
                    .into_iter()
                    .map(move |lemma| (lemma, class))
            })
            .map(|(lemma, class)| self.count_for(&lemma, class))
            .sum()
    }

    fn word_classes(&self, word: &str) -> WordClasses {
        let form = normalize_lookup(word);
        let mut classes = WordClasses::default();
        for class in WordClass::ALL {
            if !self.base_forms(&form, class).is_empty() {
                classes.set(class);
            }
        }
        classes
    }
}
