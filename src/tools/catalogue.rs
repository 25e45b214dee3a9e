//! Key names cli-vision accepts in `--inputs`
//!
//! Served by `list_supported_keys` without spawning anything.

use serde::{Deserialize, Serialize};

const ARROW_KEYS: &[&str] = &["up", "down", "left", "right"];
const NAVIGATION: &[&str] = &["home", "end", "pageup", "pagedown", "insert", "delete"];
const COMMON: &[&str] = &["enter", "space", "tab", "backspace", "escape"];
const ALT_COMBINATIONS: &[&str] = &["alt+<any key>"];
const SINGLE_CHARACTERS: &[&str] = &["a-z", "A-Z", "0-9", "any printable character"];
const EXAMPLES: &[&str] = &[
    "down,down,enter",
    "ctrl+c",
    "f1,escape",
    "hello,enter",
    "tab,tab,enter",
];

/// Categorised key names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCatalogue {
    pub arrow_keys: Vec<String>,
    pub navigation: Vec<String>,
    pub common: Vec<String>,
    pub function_keys: Vec<String>,
    pub ctrl_combinations: Vec<String>,
    /// Described by pattern, not enumerated
    pub alt_combinations: Vec<String>,
    /// Described by pattern, not enumerated
    pub single_characters: Vec<String>,
    pub examples: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl KeyCatalogue {
    /// The fixed catalogue
    pub fn supported() -> Self {
        Self {
            arrow_keys: owned(ARROW_KEYS),
            navigation: owned(NAVIGATION),
            common: owned(COMMON),
            function_keys: (1..=12).map(|n| format!("f{}", n)).collect(),
            ctrl_combinations: ('a'..='z').map(|c| format!("ctrl+{}", c)).collect(),
            alt_combinations: owned(ALT_COMBINATIONS),
            single_characters: owned(SINGLE_CHARACTERS),
            examples: owned(EXAMPLES),
        }
    }

    /// Whether `token` names an enumerated key (patterns excluded)
    pub fn is_named_key(&self, token: &str) -> bool {
        let token = token.to_ascii_lowercase();
        [
            &self.arrow_keys,
            &self.navigation,
            &self.common,
            &self.function_keys,
            &self.ctrl_combinations,
        ]
        .iter()
        .any(|category| category.iter().any(|k| *k == token))
    }
}
