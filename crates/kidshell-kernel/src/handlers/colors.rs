//! colors — colour names with a swatch and some emoji in that colour.

use super::{Handler, HandlerError, Outcome, Turn};
use crate::session::Session;
use kidshell_types::{ColorSwatch, Content, Response};

struct ColorEntry {
    name: &'static str,
    hex: &'static str,
    emojis: &'static [&'static str],
}

const COLORS: &[ColorEntry] = &[
    ColorEntry { name: "red", hex: "#ff0000", emojis: &["🍎", "🍓", "❤️", "🚒"] },
    ColorEntry { name: "orange", hex: "#ffa500", emojis: &["🍊", "🥕", "🦊"] },
    ColorEntry { name: "yellow", hex: "#ffff00", emojis: &["🍌", "🌻", "⭐", "🐥"] },
    ColorEntry { name: "green", hex: "#008000", emojis: &["🐸", "🌲", "🥦", "🍏"] },
    ColorEntry { name: "blue", hex: "#0000ff", emojis: &["🐳", "💙", "🌊", "🫐"] },
    ColorEntry { name: "purple", hex: "#800080", emojis: &["🍇", "💜", "🔮"] },
    ColorEntry { name: "pink", hex: "#ffc0cb", emojis: &["🌸", "🐷", "🦩"] },
    ColorEntry { name: "brown", hex: "#a52a2a", emojis: &["🐻", "🍫", "🌰"] },
    ColorEntry { name: "black", hex: "#000000", emojis: &["🐈‍⬛", "🎱", "🕷️"] },
    ColorEntry { name: "white", hex: "#ffffff", emojis: &["⛄", "☁️", "🥛"] },
    ColorEntry { name: "gray", hex: "#808080", emojis: &["🐘", "🐭", "🪨"] },
    ColorEntry { name: "grey", hex: "#808080", emojis: &["🐘", "🐭", "🪨"] },
    ColorEntry { name: "gold", hex: "#ffd700", emojis: &["🏆", "👑", "🥇"] },
    ColorEntry { name: "silver", hex: "#c0c0c0", emojis: &["🥈", "🥄", "🔔"] },
    ColorEntry { name: "cyan", hex: "#00ffff", emojis: &["🧊", "💎"] },
    ColorEntry { name: "magenta", hex: "#ff00ff", emojis: &["🌺", "🪀"] },
];

/// Swatch for a colour name, ignoring case.
pub fn color_named(name: &str) -> Option<ColorSwatch> {
    let lowered = name.trim().to_lowercase();
    COLORS.iter().find(|entry| entry.name == lowered).map(|entry| ColorSwatch {
        name: entry.name.to_string(),
        color: entry.hex.to_string(),
        emojis: entry.emojis.iter().map(|e| e.to_string()).collect(),
    })
}

pub struct Colors;

impl Handler for Colors {
    fn name(&self) -> &'static str {
        "colors"
    }

    fn can_handle(&self, input: &str, _session: &Session) -> bool {
        color_named(input).is_some()
    }

    fn handle(&self, input: &str, turn: &mut Turn<'_>) -> Result<Outcome, HandlerError> {
        let swatch = color_named(input).ok_or_else(|| HandlerError::NotFound(input.to_string()))?;
        turn.session.record("color", input, &swatch.color, true);
        Ok(Outcome::Matched(Response::new(Content::Color(swatch))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_named() {
        let red = color_named("Red").expect("red");
        assert_eq!(red.name, "red");
        assert_eq!(red.color, "#ff0000");
        assert!(!red.emojis.is_empty());
        assert!(color_named("tree").is_none());
    }

    #[test]
    fn test_claims() {
        assert!(Colors.can_handle("blue", &Session::new()));
        assert!(!Colors.can_handle("bleu", &Session::new()));
    }
}
