//! Locale tables for the corpus.
//!
//! Both tables are plain data so another corpus can swap them without
//! touching the resolvers.

use unicode_script::{Script, UnicodeScript};

/// Unicode scripts counted as Japanese.
pub const JAPANESE_SCRIPTS: &[Script] = &[Script::Han, Script::Hiragana, Script::Katakana];

/// Language tags preferred when a record carries several titles.
pub const PREFERRED_TITLE_LANGS: &[&str] = &["ja", "jpn", "ja-jp", "ja_jp", "japanese"];

/// True if `text` contains at least one Japanese-script character.
pub fn has_japanese(text: &str) -> bool {
    text.chars().any(|c| JAPANESE_SCRIPTS.contains(&c.script()))
}

/// True if `tag` names a preferred title language.
pub fn is_preferred_lang(tag: &str) -> bool {
    let tag = tag.trim();
    PREFERRED_TITLE_LANGS
        .iter()
        .any(|p| p.eq_ignore_ascii_case(tag))
}
