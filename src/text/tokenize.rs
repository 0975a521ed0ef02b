use once_cell::sync::Lazy;
use regex::Regex;

// Words keep inner hyphens and apostrophes ("story-driven", "o'clock"); every
// other non-space character becomes its own token.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’\-][\p{L}\p{N}]+)*|[^\s\p{L}\p{N}]")
        .expect("valid token regex")
});

// Treebank-style clitics split off the end of a word: "hero's" -> "hero" "'s",
// "don't" -> "do" "n't".
static CLITIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)(n['’]t|['’](?:s|m|d|re|ve|ll))$").expect("valid clitic regex")
});

fn push_word(tokens: &mut Vec<String>, word: &str) {
    match CLITIC_RE.captures(word) {
        Some(parts) => {
            tokens.push(parts[1].to_string());
            tokens.push(parts[2].to_string());
        }
        None => tokens.push(word.to_string()),
    }
}

pub fn word_tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for token in TOKEN_RE.find_iter(text) {
        push_word(&mut tokens, token.as_str());
    }
    tokens
}

pub fn is_punctuation(token: &str) -> bool {
    !token.is_empty() && !token.chars().any(char::is_alphanumeric)
}

pub fn is_sentence_end(token: &str) -> bool {
    matches!(token, "." | "!" | "?" | "…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_and_punctuation() {
        assert_eq!(
            word_tokenize("Powered by Unreal Engine 4, Tekken 7 features story-driven battles."),
            vec![
                "Powered",
                "by",
                "Unreal",
                "Engine",
                "4",
                ",",
                "Tekken",
                "7",
                "features",
                "story-driven",
                "battles",
                "."
            ]
        );
    }

    #[test]
    fn splits_possessives_and_contractions() {
        assert_eq!(
            word_tokenize("the hero's (last) stand"),
            vec!["the", "hero", "'s", "(", "last", ")", "stand"]
        );
        assert_eq!(
            word_tokenize("They don't know we're here"),
            vec!["They", "do", "n't", "know", "we", "'re", "here"]
        );
        assert_eq!(word_tokenize("rock 'n' roll o'clock"), vec![
            "rock", "'", "n", "'", "roll", "o'clock"
        ]);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(word_tokenize("   ").is_empty());
    }

    #[test]
    fn classifies_punctuation() {
        assert!(is_punctuation(","));
        assert!(is_punctuation("..."));
        assert!(!is_punctuation("v2"));
        assert!(is_sentence_end("?"));
        assert!(!is_sentence_end(","));
    }
}
