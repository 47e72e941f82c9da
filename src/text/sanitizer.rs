/*!
 * Multi-pass text sanitizer.
 *
 * `Sanitizer::clean` is a total function from `RawText` to `CleanText`.
 * Passes run in a fixed order:
 *
 * 1. NFC normalization
 * 2. Mojibake repair
 * 3. Rich-text format-control stripping and whitespace collapse
 * 4. Emoji/pictograph removal
 * 5. Invalid-character removal
 * 6. Surrogate removal
 * 7. UTF-8 re-encoding and trim
 * 8. Guillemet normalization
 * 9. Brace balancing
 *
 * The sequence is repeated until the text stops changing (bounded), so the
 * result is always a fixed point of `clean`.
 */

use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::text::charclass;
use crate::text::raw::{render_pieces, CleanText, Piece, RawText};

/// Pass sequences always allowed for one `clean` call; longer inputs get
/// one more round per character
const MAX_ROUNDS: usize = 4;

/// Known double-encoding artifacts, applied in order
const MOJIBAKE_TABLE: &[(&str, &str)] = &[
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ã\u{a0}", "à"),
    ("Ã ", "à"),
    ("Ã§", "ç"),
    ("Ã´", "ô"),
    ("Ãª", "ê"),
    ("Ã®", "î"),
    ("Ã¹", "ù"),
    ("Ã»", "û"),
    ("Ã¢", "â"),
    ("Ã«", "ë"),
    ("Ã¯", "ï"),
    ("Ã‰", "É"),
    ("Ã‡", "Ç"),
    ("Ãˆ", "È"),
    ("â€“", "–"),
    ("â€”", "—"),
    ("â€˜", "‘"),
    ("â€™", "’"),
    ("â€œ", "“"),
    ("â€¦", "…"),
    ("â€\u{9d}", "”"),
    ("â€", "”"),
    ("Â°", "°"),
    ("Â«", "«"),
    ("Â»", "»"),
];

static FORMAT_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\[fFcCpPhHwWqQaA][^;]*;").expect("Invalid format directive regex")
});

static LINE_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[nNtT]").expect("Invalid line escape regex"));

static BACKSLASH_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\{2,}").expect("Invalid backslash regex"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

static OPEN_GUILLEMET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<<\s*").expect("Invalid guillemet regex"));

static CLOSE_GUILLEMET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*>>").expect("Invalid guillemet regex"));

/// One step of the cleaning sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Normalize,
    Mojibake,
    FormatControl,
    Emoji,
    InvalidChars,
    Surrogates,
    Reencode,
    Punctuation,
    Braces,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pass::Normalize => "nfc",
            Pass::Mojibake => "mojibake",
            Pass::FormatControl => "format-control",
            Pass::Emoji => "emoji",
            Pass::InvalidChars => "invalid-chars",
            Pass::Surrogates => "surrogates",
            Pass::Reencode => "utf8",
            Pass::Punctuation => "punctuation",
            Pass::Braces => "braces",
        };
        f.write_str(name)
    }
}

/// A pass that changed the text, with its input and output
#[derive(Debug, Clone, PartialEq)]
pub struct PassChange {
    pub round: usize,
    pub pass: Pass,
    pub before: String,
    pub after: String,
}

/// Record of one traced `clean` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanTrace {
    /// Input rendered with lone surrogates escaped
    pub original: String,
    pub cleaned: String,
    pub changes: Vec<PassChange>,
    /// Number of full pass sequences executed
    pub rounds: usize,
}

impl CleanTrace {
    /// Whether any pass altered the text
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Emit the trace at debug level
    pub fn log(&self) {
        if !self.changed() {
            return;
        }
        debug!(
            "Cleaned text in {} round(s): '{}' -> '{}'",
            self.rounds,
            clean_for_log(&self.original),
            self.cleaned
        );
        for change in &self.changes {
            debug!(
                "  [{}:{}] '{}' -> '{}'",
                change.round,
                change.pass,
                clean_for_log(&change.before),
                clean_for_log(&change.after)
            );
        }
    }
}

/// Deterministic text cleaner
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    /// Log the pass trace of every call that changed something
    debug: bool,
}

impl Sanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sanitizer that logs its pass trace
    pub fn with_debug(debug: bool) -> Self {
        Self { debug }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Clean raw text; never fails
    pub fn clean(&self, text: &RawText) -> CleanText {
        if self.debug {
            let (clean, trace) = self.clean_traced(text);
            trace.log();
            clean
        } else {
            CleanText::new(run_to_fixpoint(text, None))
        }
    }

    /// Clean a well-formed string
    pub fn clean_str(&self, text: &str) -> CleanText {
        self.clean(&RawText::from(text))
    }

    /// Clean and return the record of which passes changed the text
    pub fn clean_traced(&self, text: &RawText) -> (CleanText, CleanTrace) {
        let mut trace = CleanTrace {
            original: text.escaped(),
            ..CleanTrace::default()
        };
        let cleaned = run_to_fixpoint(text, Some(&mut trace));
        trace.cleaned = cleaned.clone();
        (CleanText::new(cleaned), trace)
    }

    /// Character-level cleaning only (passes 4 to 7 without trimming)
    ///
    /// Used on elements that are not being translated, where rich-text markup
    /// and surrounding whitespace must be kept as they are.
    pub fn scrub(&self, text: &RawText) -> String {
        let mut out = String::new();
        for piece in text.pieces() {
            if let Piece::Text(s) = piece {
                out.extend(
                    s.chars()
                        .filter(|c| !charclass::is_pictograph(*c) && charclass::is_kept(*c)),
                );
            }
        }
        reencode(&out)
    }
}

/// Clean with a default sanitizer
pub fn clean(text: &str) -> CleanText {
    Sanitizer::new().clean_str(text)
}

/// Strip characters that would garble a log line
pub fn clean_for_log(text: &str) -> String {
    text.chars()
        .filter(|c| !charclass::is_pictograph(*c) && *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

fn run_to_fixpoint(text: &RawText, mut trace: Option<&mut CleanTrace>) -> String {
    let mut current = run_passes(text.pieces(), 1, trace.as_deref_mut());
    let mut rounds = 1;
    let limit = MAX_ROUNDS + current.chars().count();
    while rounds < limit {
        rounds += 1;
        let next = run_passes(vec![Piece::Text(current.clone())], rounds, trace.as_deref_mut());
        if next == current {
            break;
        }
        current = next;
    }
    if let Some(trace) = trace {
        trace.rounds = rounds;
    }
    current
}

fn run_passes(pieces: Vec<Piece>, round: usize, mut trace: Option<&mut CleanTrace>) -> String {
    let mut record = |pass: Pass, before: &[Piece], after: &[Piece]| {
        if let Some(trace) = trace.as_deref_mut() {
            let before = render_pieces(before);
            let after = render_pieces(after);
            if before != after {
                trace.changes.push(PassChange { round, pass, before, after });
            }
        }
    };

    let text_passes: [(Pass, fn(&str) -> String); 4] = [
        (Pass::Normalize, normalize),
        (Pass::Mojibake, repair_mojibake),
        (Pass::FormatControl, strip_format_control),
        (Pass::Emoji, remove_pictographs),
    ];

    let mut pieces = pieces;
    for (pass, apply) in text_passes {
        let next = map_text(&pieces, apply);
        record(pass, &pieces, &next);
        pieces = next;
    }

    let next: Vec<Piece> = pieces
        .iter()
        .filter_map(|piece| match piece {
            Piece::Text(s) => Some(Piece::Text(s.chars().filter(|c| charclass::is_kept(*c)).collect())),
            Piece::LoneSurrogate(_) => None,
        })
        .collect();
    record(Pass::InvalidChars, &pieces, &next);
    pieces = next;

    let flat: String = pieces
        .iter()
        .filter_map(|piece| match piece {
            Piece::Text(s) => Some(s.as_str()),
            Piece::LoneSurrogate(_) => None,
        })
        .collect();
    record(Pass::Surrogates, &pieces, &[Piece::Text(flat.clone())]);

    let mut text = flat;
    let string_passes: [(Pass, fn(&str) -> String); 3] = [
        (Pass::Reencode, reencode_trimmed),
        (Pass::Punctuation, normalize_guillemets),
        (Pass::Braces, balance_braces),
    ];
    for (pass, apply) in string_passes {
        let next = apply(&text);
        record(pass, &[Piece::Text(text.clone())], &[Piece::Text(next.clone())]);
        text = next;
    }
    text
}

fn map_text(pieces: &[Piece], apply: fn(&str) -> String) -> Vec<Piece> {
    pieces
        .iter()
        .map(|piece| match piece {
            Piece::Text(s) => Piece::Text(apply(s)),
            Piece::LoneSurrogate(unit) => Piece::LoneSurrogate(*unit),
        })
        .collect()
}

fn normalize(text: &str) -> String {
    text.nfc().collect()
}

fn repair_mojibake(text: &str) -> String {
    let mut out = text.to_string();
    for (wrong, right) in MOJIBAKE_TABLE {
        if out.contains(wrong) {
            out = out.replace(wrong, right);
        }
    }
    out
}

fn strip_format_control(text: &str) -> String {
    let out = FORMAT_DIRECTIVE.replace_all(text, "");
    let out = LINE_ESCAPE.replace_all(&out, " ");
    let out = BACKSLASH_RUN.replace_all(&out, "\\");
    WHITESPACE_RUN.replace_all(&out, " ").into_owned()
}

fn remove_pictographs(text: &str) -> String {
    text.chars().filter(|c| !charclass::is_pictograph(*c)).collect()
}

fn reencode(text: &str) -> String {
    let bytes = text.as_bytes().to_vec();
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes())
            .chars()
            .filter(|c| *c != char::REPLACEMENT_CHARACTER)
            .collect(),
    }
}

fn reencode_trimmed(text: &str) -> String {
    reencode(text).trim().to_string()
}

fn normalize_guillemets(text: &str) -> String {
    let out = OPEN_GUILLEMET.replace_all(text, "« ");
    CLOSE_GUILLEMET.replace_all(&out, " »").into_owned()
}

fn balance_braces(text: &str) -> String {
    let open = text.matches('{').count();
    let close = text.matches('}').count();
    if open == close + 1 {
        format!("{}}}", text)
    } else if close == open + 1 {
        format!("{{{}", text)
    } else {
        text.to_string()
    }
}
