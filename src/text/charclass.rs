/*!
 * Code-point classification.
 *
 * Every call site that needs to decide whether a character is an ideograph,
 * a pictograph or simply unprintable goes through this table. Checks are
 * made per character on scalar values, never through a single regex, so
 * ideographs can not be swept up by a pictograph range.
 */

use unicode_general_category::{get_general_category, GeneralCategory};

/// CJK unified ideograph blocks that must always survive cleaning
const CJK_RANGES: &[(u32, u32)] = &[
    (0x4E00, 0x9FFF),   // CJK Unified Ideographs
    (0x3400, 0x4DBF),   // Extension A
    (0x20000, 0x2A6DF), // Extension B
    (0xF900, 0xFAFF),   // Compatibility Ideographs
];

/// Emoji, pictograph and dingbat ranges removed by the emoji pass
const PICTOGRAPH_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F), // emoticons
    (0x1F300, 0x1F5FF), // symbols & pictographs
    (0x1F680, 0x1F6FF), // transport & map
    (0x1F1E0, 0x1F1FF), // regional indicators
    (0x2600, 0x26FF),   // misc symbols
    (0x2700, 0x27BF),   // dingbats
    (0xFE00, 0xFE0F),   // variation selectors
    (0x1F900, 0x1F9FF), // supplemental symbols & pictographs
    (0x1FA70, 0x1FAFF), // symbols & pictographs extended-A
    (0x1F018, 0x1F270), // playing cards, enclosed supplements
    (0x238C, 0x2454),
    (0x200D, 0x200D), // zero width joiner inside emoji sequences
    (0x20E3, 0x20E3), // combining enclosing keycap
];

/// Single code points with emoji presentation outside the ranges above
const PICTOGRAPH_POINTS: &[u32] = &[0x3030, 0x00A9, 0x00AE, 0x303D, 0x2049, 0x203C];

/// Latin-1 Supplement and Latin Extended-A, kept for accented French letters
const ACCENTED_LATIN: (u32, u32) = (0x00A0, 0x017F);

fn in_ranges(c: char, ranges: &[(u32, u32)]) -> bool {
    let cp = c as u32;
    ranges.iter().any(|&(lo, hi)| cp >= lo && cp <= hi)
}

/// Whether `c` is a CJK ideograph
pub fn is_cjk_ideograph(c: char) -> bool {
    in_ranges(c, CJK_RANGES)
}

/// Whether `c` is an emoji or pictographic symbol
pub fn is_pictograph(c: char) -> bool {
    // Ideographs win over any overlapping symbol range
    if is_cjk_ideograph(c) {
        return false;
    }
    PICTOGRAPH_POINTS.contains(&(c as u32)) || in_ranges(c, PICTOGRAPH_RANGES)
}

/// Whether `c` lies in the accented Latin ranges
pub fn is_accented_latin(c: char) -> bool {
    in_ranges(c, &[ACCENTED_LATIN])
}

/// General category L*
pub fn is_letter(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
    )
}

/// Printable in the usual sense: not a control, format, private-use,
/// unassigned or separator character, with the ASCII space allowed
pub fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
            | GeneralCategory::SpaceSeparator
    )
}

/// Whether a UTF-16 code unit is in the surrogate range
pub fn is_surrogate_unit(unit: u16) -> bool {
    (0xD800..=0xDFFF).contains(&unit)
}

/// Keep rule of the invalid-character pass
pub fn is_kept(c: char) -> bool {
    if c == char::REPLACEMENT_CHARACTER {
        return false;
    }
    is_cjk_ideograph(c) || is_accented_latin(c) || is_letter(c) || is_printable(c)
}

/// Whether `c` belongs to the script expected for `lang`
///
/// Only the scripts the supported directions need are known; any other
/// language accepts every letter.
pub fn is_script_char(c: char, lang: &str) -> bool {
    match lang {
        "zh" => is_cjk_ideograph(c),
        "fr" | "en" => c.is_ascii_alphabetic() || (is_accented_latin(c) && is_letter(c)),
        _ => is_letter(c),
    }
}
