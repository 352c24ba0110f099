//! emoji — show the emoji for a word.
//!
//! Names come from the full Unicode emoji list: every gemoji shortcode
//! (`cat`, `evergreen_tree`) plus the CLDR name in snake case (`red_apple`,
//! `flag_france`). Skin-tone variants are never listed.

use std::sync::LazyLock;

use super::{color_named, is_alpha_word, Handler, HandlerError, Outcome, Turn};
use crate::session::Session;
use kidshell_types::{Content, EmojiMatch, Response};

/// Kid words the emoji names miss.
const ALIASES: &[(&str, &str)] = &[("dinosaur", "🦕"), ("dino", "🦕"), ("kitty", "🐱"), ("puppy", "🐶")];

const MIN_WORD: usize = 3;
const MAX_WORD: usize = 49;

struct NamedEmoji {
    emoji: &'static str,
    names: Vec<String>,
}

static NAMED: LazyLock<Vec<NamedEmoji>> = LazyLock::new(|| {
    emojis::iter()
        .filter(|e| !e.name().contains("skin tone"))
        .map(|e| {
            let mut names: Vec<String> = e.shortcodes().map(str::to_string).collect();
            let cldr = snake_case(e.name());
            if !names.contains(&cldr) {
                names.push(cldr);
            }
            NamedEmoji {
                emoji: e.as_str(),
                names,
            }
        })
        .collect()
});

/// `"flag: United States"` → `"flag_united_states"`.
fn snake_case(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn exact(word: &str) -> Option<&'static str> {
    if let Some((_, emoji)) = ALIASES.iter().find(|(name, _)| *name == word) {
        return Some(*emoji);
    }
    if let Some(found) = emojis::get_by_shortcode(word) {
        return Some(found.as_str());
    }
    NAMED
        .iter()
        .find(|named| named.names.iter().any(|name| name == word))
        .map(|named| named.emoji)
}

/// Emoji whose name contains `word` as a whole `_` component, once each.
fn by_component(word: &str) -> Vec<String> {
    NAMED
        .iter()
        .filter(|named| named.names.iter().any(|name| name.split('_').any(|part| part == word)))
        .map(|named| named.emoji.to_string())
        .collect()
}

/// Look `word` up: an exact name wins, otherwise every component match.
pub fn emoji_for(word: &str) -> Option<EmojiMatch> {
    if let Some(emoji) = exact(word) {
        return Some(EmojiMatch {
            word: word.to_string(),
            emojis: vec![emoji.to_string()],
            multiple: false,
        });
    }
    let emojis = by_component(word);
    (!emojis.is_empty()).then(|| EmojiMatch {
        word: word.to_string(),
        emojis,
        multiple: true,
    })
}

/// Whether the emoji handler would answer `word`.
pub fn is_emoji_word(word: &str) -> bool {
    let len = word.chars().count();
    (MIN_WORD..=MAX_WORD).contains(&len) && (exact(word).is_some() || !by_component(word).is_empty())
}

fn emoji_response(found: EmojiMatch) -> Response {
    Response::new(Content::Emoji(found))
}

pub struct Emoji;

impl Handler for Emoji {
    fn name(&self) -> &'static str {
        "emoji"
    }

    fn can_handle(&self, input: &str, _session: &Session) -> bool {
        let len = input.chars().count();
        (MIN_WORD..=MAX_WORD).contains(&len) && is_alpha_word(input) && color_named(input).is_none()
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let found = emoji_for(input).ok_or_else(|| HandlerError::NotFound(format!("{input}: not emoji")))?;
        turn.session.record("emoji", input, &found.emojis, true);
        Ok(Outcome::Matched(emoji_response(found)))
    }
}

/// Last resort for phrases: emoji for every word that has one.
pub struct EmojiSearch;

impl Handler for EmojiSearch {
    fn name(&self) -> &'static str {
        "emoji_search"
    }

    fn can_handle(&self, input: &str, _session: &Session) -> bool {
        input.split_whitespace().count() > 1
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let emojis: Vec<String> = input
            .split_whitespace()
            .filter_map(|word| exact(&word.to_lowercase()))
            .map(str::to_string)
            .collect();
        if emojis.is_empty() {
            return Ok(Outcome::Declined);
        }
        turn.session.record("emoji", input, &emojis, true);
        Ok(Outcome::Matched(emoji_response(EmojiMatch {
            word: input.to_string(),
            multiple: emojis.len() > 1,
            emojis,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::ScriptedQuizzes;
    use crate::safe_math::SafeMathEvaluator;

    use rstest::rstest;

    #[test]
    fn test_exact_match_wins() {
        let found = emoji_for("cat").expect("cat");
        assert_eq!(found.emojis, vec!["🐱".to_string()]);
        assert!(!found.multiple);
    }

    #[rstest]
    #[case("hedgehog", "🦔")]
    #[case("avocado", "🥑")]
    #[case("broccoli", "🥦")]
    #[case("sauropod", "🦕")]
    #[case("red_apple", "🍎")]
    #[case("dinosaur", "🦕")]
    fn test_names_beyond_everyday_words(#[case] word: &str, #[case] emoji: &str) {
        let found = emoji_for(word).expect("known emoji name");
        assert_eq!(found.emojis, vec![emoji.to_string()]);
    }

    #[test]
    fn test_component_match_skips_skin_tones() {
        let found = emoji_for("tree").expect("tree");
        assert!(found.multiple);
        assert!(found.emojis.iter().any(|e| e == "🌲"));
        assert!(found.emojis.iter().any(|e| e == "🌴"));

        let thumbs = emoji_for("thumbs").expect("thumbs");
        assert!(thumbs.emojis.contains(&"👍".to_string()));
        assert!(thumbs.emojis.contains(&"👎".to_string()));
        assert!(thumbs.emojis.iter().all(|e| !e.contains('\u{1F3FB}') && !e.contains('\u{1F3FF}')));
    }

    #[test]
    fn test_flags_by_country_name() {
        let found = emoji_for("france").expect("france");
        assert!(found.emojis.contains(&"🇫🇷".to_string()));
    }

    #[test]
    fn test_snake_case_names() {
        assert_eq!(snake_case("flag: United States"), "flag_united_states");
        assert_eq!(snake_case("woman’s hat"), "woman_s_hat");
    }

    #[test]
    fn test_unknown_word() {
        assert!(emoji_for("zzzz").is_none());
        assert!(!is_emoji_word("foo"));
        assert!(is_emoji_word("tree"));
        // Too short for the emoji handler, so still free to be a symbol.
        assert!(!is_emoji_word("x"));
        assert!(!is_emoji_word("ox"));
    }

    #[test]
    fn test_claims() {
        let session = Session::new();
        assert!(Emoji.can_handle("tree", &session));
        assert!(!Emoji.can_handle("ox", &session));
        assert!(!Emoji.can_handle("two words", &session));
        assert!(!Emoji.can_handle("blue", &session));
    }

    #[test]
    fn test_search_finds_words_in_phrase() {
        let mut session = Session::new();
        let mut evaluator = SafeMathEvaluator::new();
        let mut quizzes = ScriptedQuizzes::new(Vec::new());
        let mut turn = Turn {
            session: &mut session,
            evaluator: &mut evaluator,
            quizzes: &mut quizzes,
        };
        let Ok(Outcome::Matched(response)) = EmojiSearch.handle("my dog", &mut turn) else {
            panic!("phrase with dog should match");
        };
        assert!(matches!(response.content, Content::Emoji(ref found) if found.emojis == ["🐶"]));
        assert!(matches!(EmojiSearch.handle("hi there", &mut turn), Ok(Outcome::Declined)));
    }
}
