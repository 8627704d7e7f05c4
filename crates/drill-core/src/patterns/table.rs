pub(crate) const DEFAULT_TOML: &str = include_str!("default_patterns.toml");

/// ASCII symbols that type as themselves, alongside the digits 0-9.
pub(crate) const LITERAL_SYMBOLS: [char; 11] =
    [',', '.', '/', '-', '!', '?', '[', ']', '(', ')', '~'];

/// Spellings that cannot take a doubled leading consonant for っ.
pub(crate) const NO_SOKUON_SPELLINGS: [&str; 4] = ["i", "u", "nn", "n'"];

/// Seed kana whose row never follows っ.
pub(crate) fn blocks_sokuon(first: char) -> bool {
    matches!(first, 'あ' | 'え' | 'お' | 'っ') || ('な'..='の').contains(&first)
}
