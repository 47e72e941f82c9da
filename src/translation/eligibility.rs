/*!
 * Decide whether a cleaned string is worth sending to a backend.
 */

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::charclass;
use crate::translation::language::Direction;

/// Digits, whitespace and the symbols used in dimensions and part numbers
static NON_TRANSLATABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\d\s.,:;*×x\-_/\\%°(){}\[\]]+$").expect("Invalid non-translatable regex")
});

/// Share of non-alphanumeric characters above which ASCII text is skipped
const MAX_SYMBOL_RATIO: f64 = 0.6;

/// Share of readable characters below which text is considered corrupted
const MIN_READABLE_RATIO: f64 = 0.5;

/// Why a string was not sent to a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    /// Only digits, whitespace and dimension symbols
    NonTranslatable,
    /// ASCII text dominated by symbols
    SymbolHeavy,
    /// Too few readable characters
    Unreadable,
    /// No character of the source script
    MissingScript,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Empty => "empty",
            Self::NonTranslatable => "numbers/symbols only",
            Self::SymbolHeavy => "mostly symbols",
            Self::Unreadable => "unreadable",
            Self::MissingScript => "no source-language characters",
        };
        f.write_str(reason)
    }
}

/// Outcome of the eligibility filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Translate,
    Skip(SkipReason),
}

impl Verdict {
    pub fn is_translate(&self) -> bool {
        matches!(self, Self::Translate)
    }
}

/// Run the filter on already cleaned text
pub fn check(cleaned: &str, direction: Direction) -> Verdict {
    let text = cleaned.trim();
    if text.is_empty() {
        return Verdict::Skip(SkipReason::Empty);
    }

    if NON_TRANSLATABLE.is_match(text) {
        return Verdict::Skip(SkipReason::NonTranslatable);
    }

    let total = text.chars().count() as f64;

    if text.is_ascii() {
        let symbols = text.chars().filter(|c| !c.is_ascii_alphanumeric()).count() as f64;
        if symbols / total > MAX_SYMBOL_RATIO {
            return Verdict::Skip(SkipReason::SymbolHeavy);
        }
    }

    let readable = text
        .chars()
        .filter(|c| charclass::is_printable(*c) || charclass::is_cjk_ideograph(*c))
        .count() as f64;
    if readable / total < MIN_READABLE_RATIO {
        return Verdict::Skip(SkipReason::Unreadable);
    }

    if !text.chars().any(|c| charclass::is_script_char(c, direction.source())) {
        return Verdict::Skip(SkipReason::MissingScript);
    }

    Verdict::Translate
}
