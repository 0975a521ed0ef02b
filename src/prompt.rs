use std::collections::BTreeSet;

use crate::igdb::GameKeywords;

pub const QUALITY_TAGS: [&str; 3] = ["masterpiece", "best quality", "very aesthetic"];
pub const COMPOSITION_TAGS: [&str; 3] = ["solo", "upper body", "v"];

pub const NEGATIVE_PROMPT: &str = "nsfw, lowres, (bad), text, error, fewer, extra, missing, worst quality, jpeg artifacts, low quality, watermark, unfinished, displeasing, oldest, early, chromatic aberration, signature, extra digits, artistic error, username, scan, [abstract]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOptions {
    pub gender: String,
    pub facial_expression: String,
    pub looking_at: String,
    pub indoors: String,
    pub daytime: String,
    pub additional_tags: Vec<String>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        StyleOptions {
            gender: String::new(),
            facial_expression: "smile".to_string(),
            looking_at: "viewer".to_string(),
            indoors: "indoors".to_string(),
            daytime: "night".to_string(),
            additional_tags: Vec::new(),
        }
    }
}

impl StyleOptions {
    /// Splits comma-separated user tags, lowercased, blanks dropped.
    pub fn parse_tags(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// A finished prompt for one character variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub style_prefix: Vec<String>,
    pub character_descriptor: String,
    pub contextual_fields: Vec<String>,
    pub tags: Vec<String>,
    pub negative_prompt: &'static str,
}

impl PromptSpec {
    pub fn prompt(&self) -> String {
        self.style_prefix
            .iter()
            .chain(std::iter::once(&self.character_descriptor))
            .chain(self.contextual_fields.iter())
            .chain(self.tags.iter())
            .filter(|fragment| !fragment.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn fragment(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn build_prompt(game: &GameKeywords, character: &str, style: &StyleOptions) -> PromptSpec {
    let mut style_prefix = vec![game.recency.as_str().to_string()];
    style_prefix.extend(QUALITY_TAGS.iter().map(|tag| tag.to_string()));
    style_prefix.push(fragment(&style.gender));

    let mut contextual_fields: Vec<String> =
        COMPOSITION_TAGS.iter().map(|tag| tag.to_string()).collect();
    contextual_fields.push(fragment(&style.facial_expression));
    let looking_at = fragment(&style.looking_at);
    if !looking_at.is_empty() {
        contextual_fields.push(format!("looking at {looking_at}"));
    }
    contextual_fields.push(fragment(&style.indoors));
    contextual_fields.push(fragment(&style.daytime));
    contextual_fields.push(fragment(&game.name));

    let keyword_tags: BTreeSet<String> = game
        .keywords
        .iter()
        .map(|keyword| fragment(keyword))
        .filter(|keyword| !keyword.is_empty())
        .collect();
    let mut tags: Vec<String> = keyword_tags.into_iter().collect();
    tags.extend(style.additional_tags.iter().map(|tag| fragment(tag)));

    PromptSpec {
        style_prefix: style_prefix.into_iter().filter(|f| !f.is_empty()).collect(),
        character_descriptor: fragment(character),
        contextual_fields: contextual_fields.into_iter().filter(|f| !f.is_empty()).collect(),
        tags: tags.into_iter().filter(|f| !f.is_empty()).collect(),
        negative_prompt: NEGATIVE_PROMPT,
    }
}

/// One prompt per character variant, identical apart from the descriptor.
pub fn build_prompts(
    game: &GameKeywords,
    characters: &[String],
    style: &StyleOptions,
) -> Vec<PromptSpec> {
    characters
        .iter()
        .map(|character| build_prompt(game, character, style))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recency::RecencyBucket;

    fn tekken() -> GameKeywords {
        GameKeywords {
            name: "Tekken 7".to_string(),
            recency: RecencyBucket::Mid,
            keywords: ["Fighting", "epic"].into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn assembles_fragments_in_order() {
        let style = StyleOptions {
            gender: "1boy".to_string(),
            additional_tags: StyleOptions::parse_tags("Fantasy, adventure"),
            ..StyleOptions::default()
        };
        let spec = build_prompt(
            &tekken(),
            "1boy, male focus, uzumaki naruto, naruto \\(series\\)",
            &style,
        );
        assert_eq!(
            spec.prompt(),
            "mid, masterpiece, best quality, very aesthetic, 1boy, 1boy, male focus, uzumaki naruto, naruto \\(series\\), solo, upper body, v, smile, looking at viewer, indoors, night, tekken 7, epic, fighting, fantasy, adventure"
        );
        assert_eq!(spec.negative_prompt, NEGATIVE_PROMPT);
    }

    #[test]
    fn empty_fragments_are_dropped() {
        let style = StyleOptions {
            gender: String::new(),
            facial_expression: String::new(),
            looking_at: "  ".to_string(),
            indoors: "Outdoors".to_string(),
            daytime: String::new(),
            additional_tags: Vec::new(),
        };
        let game = GameKeywords {
            name: "Celeste".to_string(),
            recency: RecencyBucket::Recent,
            keywords: BTreeSet::new(),
        };
        let spec = build_prompt(&game, "Madeline", &style);
        assert_eq!(
            spec.prompt(),
            "recent, masterpiece, best quality, very aesthetic, madeline, solo, upper body, v, outdoors, celeste"
        );
        assert!(!spec.prompt().contains(", ,"));
    }

    #[test]
    fn one_prompt_per_character_variant() {
        let characters = vec![
            "1girl, hatsune miku, vocaloid".to_string(),
            "1girl, kita ikuyo, bocchi the rock!".to_string(),
        ];
        let specs = build_prompts(&tekken(), &characters, &StyleOptions::default());

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].character_descriptor, characters[0]);
        assert_eq!(specs[1].character_descriptor, characters[1]);
        assert_eq!(specs[0].style_prefix, specs[1].style_prefix);
        assert_eq!(specs[0].contextual_fields, specs[1].contextual_fields);
        assert_eq!(specs[0].tags, specs[1].tags);
        assert!(specs[1].prompt().contains("very aesthetic, 1girl, kita ikuyo"));
    }

    #[test]
    fn parses_user_tags() {
        assert_eq!(
            StyleOptions::parse_tags(" Rain,,  Neon Lights ,"),
            vec!["rain", "neon lights"]
        );
        assert!(StyleOptions::parse_tags("").is_empty());
    }

    #[test]
    fn negative_prompt_is_constant() {
        let a = build_prompt(&tekken(), "a", &StyleOptions::default());
        let b = build_prompt(&tekken(), "b", &StyleOptions::default());
        assert_eq!(a.negative_prompt, b.negative_prompt);
        assert!(a.negative_prompt.starts_with("nsfw, lowres"));
    }
}
