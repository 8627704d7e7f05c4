//! Character-level classification and normalization for drill kana.

/// Check the full Hiragana block (U+3040..U+309F).
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the full Katakana block (U+30A0..U+30FF).
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

/// Characters after which ん must be typed in full ("nn", "n'", "xn"):
/// the vowel row with its small forms, the な row, や through よ, and ん.
pub fn is_nasal_exempt(c: char) -> bool {
    ('あ'..='お').contains(&c) || ('な'..='の').contains(&c) || ('や'..='よ').contains(&c) || c == 'ん'
}

/// Fold a sentence's kana into the alphabet the pattern table is keyed by.
///
/// Katakana becomes hiragana, except ヴ, ヵ and ヶ which have their own
/// entries. The long vowel mark, full-width punctuation and full-width digits
/// become their ASCII counterparts. Everything else passes through unchanged.
pub fn normalize_kana(s: &str) -> String {
    s.chars().map(normalize_char).collect()
}

fn normalize_char(c: char) -> char {
    match c {
        // ァ..ン
        '\u{30A1}'..='\u{30F3}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        'ー' | '－' => '-',
        '、' | '，' => ',',
        '。' | '．' => '.',
        '！' => '!',
        '？' => '?',
        '（' => '(',
        '）' => ')',
        '［' | '「' => '[',
        '］' | '」' => ']',
        '～' | '〜' => '~',
        '／' => '/',
        '０'..='９' => char::from_u32(c as u32 - 0xFF10 + '0' as u32).unwrap_or(c),
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_katakana() {
        assert_eq!(normalize_kana("カタカナ"), "かたかな");
        assert_eq!(normalize_kana("キャンプ"), "きゃんぷ");
        assert_eq!(normalize_kana("ヴァイオリン"), "ヴぁいおりん");
        assert_eq!(normalize_kana("ヶ"), "ヶ");
    }

    #[test]
    fn test_normalize_symbols() {
        assert_eq!(normalize_kana("らーめん。"), "ら-めん.");
        assert_eq!(normalize_kana("はい、そう！"), "はい,そう!");
        assert_eq!(normalize_kana("２０２４"), "2024");
        assert_eq!(normalize_kana("abc"), "abc");
        assert_eq!(normalize_kana(""), "");
    }

    #[test]
    fn test_nasal_exempt() {
        for c in ['あ', 'ぃ', 'お', 'な', 'の', 'や', 'ゅ', 'よ', 'ん'] {
            assert!(is_nasal_exempt(c), "{c} should be exempt");
        }
        for c in ['か', 'ま', 'ゃ', 'ら', 'わ', '1', '.'] {
            assert!(!is_nasal_exempt(c), "{c} should not be exempt");
        }
    }

    #[test]
    fn test_char_classification() {
        assert!(is_hiragana('あ'));
        assert!(!is_hiragana('ア'));
        assert!(is_katakana('ア'));
        assert!(is_katakana('ー'));
        assert!(!is_katakana('あ'));
    }
}
