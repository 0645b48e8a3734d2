//! # Command Interpreter
//!
//! Typed letters land in a target's [`TextHolder`](crate::engine_state::entities::components::TextHolder)
//! buffer. After every letter the buffer is matched against the words the
//! target responds to, narrowed to the words the typist knows:
//!
//! - an exact match with an effect locks the buffer and schedules the effect
//!   after a reading delay; the buffer turns green or gray by the effect's result
//! - a prefix of a known word keeps the buffer open for more letters
//! - anything else locks the buffer, turns it red after a short delay and
//!   never runs an effect
//!
//! Every buffer ends by fading out, which clears and unlocks it. Letters that
//! hit a locked buffer are dropped.
//!
//! Matching ignores case.

use phf::phf_map;

pub mod effects;
pub mod interpreter;

/// The effect a word triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Melee strike with the actor's weapon
    Hit,
    /// Open a door
    Open,
    /// Close a door
    Close,
    /// Pick up an item
    Take,
    /// Mana-costed ranged spell
    Zap,
}

/// Every word with an effect.
pub static LEXICON: phf::Map<&'static str, Command> = phf_map! {
    "hit" => Command::Hit,
    "open" => Command::Open,
    "close" => Command::Close,
    "take" => Command::Take,
    "zap" => Command::Zap,
};

/// Result of matching a buffer against a word list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexiconMatch {
    /// The buffer is exactly a word with this effect.
    Command(Command),
    /// The buffer is a prefix of some word, or a word without an effect.
    Prefix,
    /// No word starts with the buffer, or the match is ambiguous.
    Invalid,
}

/// Matches `text` against `words`, ignoring case.
pub fn check_lexicon(words: &[String], text: &str) -> LexiconMatch {
    let text = text.to_lowercase();
    if text.is_empty() {
        return LexiconMatch::Prefix;
    }

    let mut exact: Option<Command> = None;
    let mut prefix = false;
    for word in words {
        let word = word.to_lowercase();
        if word == text {
            match (LEXICON.get(word.as_str()).copied(), exact) {
                (Some(command), None) => exact = Some(command),
                (Some(command), Some(found)) if command != found => {
                    return LexiconMatch::Invalid;
                }
                _ => prefix = true,
            }
        } else if word.starts_with(&text) {
            prefix = true;
        }
    }

    match exact {
        Some(command) => LexiconMatch::Command(command),
        None if prefix => LexiconMatch::Prefix,
        None => LexiconMatch::Invalid,
    }
}
