pub mod keywords;
pub mod lexicon;
pub mod pos;
pub mod tokenize;
pub mod wordnet;

pub use keywords::KeywordExtractor;
pub use lexicon::{Lexicon, WordNetLexicon};
pub use wordnet::ensure_wordnet;
