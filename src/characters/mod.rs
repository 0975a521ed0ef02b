pub mod fuzzy;
pub mod resolver;

pub use resolver::{CharacterResolver, CharacterSource, HttpCharacterSource};
