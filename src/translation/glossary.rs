/*!
 * Glossary and context tables.
 *
 * Read-only lookup tables loaded once per run:
 * - abbreviation map (dimension codes and floor levels, expanded before translation)
 * - context tables (term hints per direction)
 * - correction tables (known wrong translation → canonical translation per direction)
 * - multi-language term map (Chinese term → [English, French])
 *
 * A missing or unreadable file never fails the run; the matching feature
 * simply does nothing.
 */

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::app_config::GlossaryConfig;
use crate::text::charclass;
use crate::translation::language::Direction;

/// Label that opens a context hint
pub const HINT_LABEL: &str = "建筑术语";

/// Label that introduces the source text in a prompt carrying a hint
pub const SOURCE_LABEL: &str = "原文";

/// Maximum number of term pairs listed in one hint
const MAX_HINTS: usize = 3;

/// Corrections applied to zh → fr output when no file overrides them
const BUILTIN_ZH_TO_FR_CORRECTIONS: &[(&str, &str)] = &[
    ("variole", "plafond"),
    ("virus du plafond", "plafond"),
    ("maladie du plafond", "plafond"),
    ("plan de variole", "plan de plafond"),
    ("fleur de plafond", "plafond"),
    ("toilettes salle de bain", "salle de bain"),
    ("cuisine cuisine", "cuisine"),
];

static DIMENSION_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([WHDL])\s*[:：]\s*(\d+\.?\d*\s*(?:mm|cm|m)?)")
        .expect("Invalid dimension value regex")
});

static DIMENSION_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([WHDL])\s*(\d+)\s*[*×x]\s*([WHDL])\s*(\d+)")
        .expect("Invalid dimension pair regex")
});

static LEAKED_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*术语[：:][^.]*\.\s*").expect("Invalid leaked hint regex"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Ordered surface form → replacement table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlossaryTable {
    entries: Vec<(String, String)>,
}

impl GlossaryTable {
    pub fn new<K: Into<String>, V: Into<String>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Parse a JSON object of string values, keeping key order
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(json)?;
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            match value {
                Value::String(s) => entries.push((key, s)),
                other => return Err(anyhow!("Value for '{}' is not a string: {}", key, other)),
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }
}

/// One term of the multi-language map
#[derive(Debug, Clone, PartialEq)]
pub struct TermEntry {
    pub zh: String,
    pub en: String,
    pub fr: String,
}

/// Chinese term → (English, French) table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermMap {
    entries: Vec<TermEntry>,
}

impl TermMap {
    pub fn new(entries: Vec<TermEntry>) -> Self {
        Self { entries }
    }

    /// Parse `{"天花板": ["ceiling", "plafond"], ...}`; malformed entries are skipped
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(json)?;
        let mut entries = Vec::with_capacity(map.len());
        for (zh, value) in map {
            let variants = match value.as_array() {
                Some(v) if v.len() >= 2 => v,
                _ => {
                    debug!("Skipping term '{}': expected [english, french]", zh);
                    continue;
                }
            };
            let text = |v: &Value| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            entries.push(TermEntry {
                zh,
                en: text(&variants[0]),
                fr: text(&variants[1]),
            });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace known terms by their counterpart in the target language
    pub fn apply(&self, text: &str, direction: Direction) -> String {
        let mut out = text.to_string();
        if !direction.involves_chinese() {
            return out;
        }
        for entry in &self.entries {
            let (from, to) = match direction {
                Direction::ZhToFr => (&entry.zh, &entry.fr),
                Direction::ZhToEn => (&entry.zh, &entry.en),
                Direction::FrToZh => (&entry.fr, &entry.zh),
                Direction::EnToZh | Direction::EnToFr | Direction::FrToEn => (&entry.en, &entry.zh),
            };
            if !from.is_empty() && out.contains(from.as_str()) {
                out = out.replace(from.as_str(), to);
            }
        }
        out
    }
}

/// All glossary data of one run
#[derive(Debug, Clone, Default)]
pub struct GlossaryStore {
    abbreviations: GlossaryTable,
    context: HashMap<Direction, GlossaryTable>,
    corrections: HashMap<Direction, Vec<(Regex, String)>>,
    terms: TermMap,
}

impl GlossaryStore {
    /// Empty store; only the built-in corrections are active
    pub fn new() -> Self {
        let mut store = Self::default();
        store.set_corrections(Direction::ZhToFr, builtin_corrections());
        store
    }

    /// Load every table from the configured directory
    pub fn load(config: &GlossaryConfig) -> Self {
        let dir = Path::new(&config.directory);
        let mut store = Self::new();

        if let Some(table) = load_table(&dir.join(&config.abbreviations_file)) {
            store.abbreviations = uppercase_keys(table);
        }

        for direction in Direction::ALL {
            if let Some(table) = load_optional_table(&dir.join(format!("context_{}.json", direction.key()))) {
                store.context.insert(direction, table);
            }
            let path = dir.join(format!("corrections_{}.json", direction.key()));
            if let Some(table) = load_optional_table(&path) {
                store.set_corrections(direction, table);
            }
        }

        let term_path = dir.join(&config.term_map_file);
        match read_file(&term_path).and_then(|json| TermMap::from_json_str(&json)) {
            Ok(terms) => store.terms = terms,
            Err(e) => warn!("Term map unavailable, term substitution disabled: {}", e),
        }

        debug!(
            "Glossary loaded: {} abbreviations, {} context tables, {} correction tables, {} terms",
            store.abbreviations.len(),
            store.context.len(),
            store.corrections.len(),
            store.terms.len()
        );
        store
    }

    pub fn with_abbreviations(mut self, table: GlossaryTable) -> Self {
        self.abbreviations = uppercase_keys(table);
        self
    }

    pub fn with_context(mut self, direction: Direction, table: GlossaryTable) -> Self {
        self.context.insert(direction, table);
        self
    }

    pub fn with_corrections(mut self, direction: Direction, table: GlossaryTable) -> Self {
        self.set_corrections(direction, table);
        self
    }

    pub fn with_terms(mut self, terms: TermMap) -> Self {
        self.terms = terms;
        self
    }

    /// Context terms of one direction, in file order
    pub fn context_terms(&self, direction: Direction) -> Vec<(String, String)> {
        self.context
            .get(&direction)
            .map(|t| t.clone().into_entries())
            .unwrap_or_default()
    }

    fn set_corrections(&mut self, direction: Direction, table: GlossaryTable) {
        let compiled = table
            .iter()
            .filter(|(wrong, _)| !wrong.is_empty())
            .filter_map(|(wrong, right)| match Regex::new(&whole_word_pattern(wrong)) {
                Ok(re) => Some((re, right.to_string())),
                Err(e) => {
                    warn!("Skipping correction '{}': {}", wrong, e);
                    None
                }
            })
            .collect();
        self.corrections.insert(direction, compiled);
    }

    /// Rewrite text before it is sent to a backend
    pub fn preprocess(&self, text: &str, direction: Direction) -> String {
        let expanded = self.expand_abbreviations(text, direction);
        self.terms.apply(&expanded, direction)
    }

    /// Expand dimension codes and stand-alone abbreviations
    ///
    /// Only applies when translating into Chinese, since the expanded terms are Chinese.
    pub fn expand_abbreviations(&self, text: &str, direction: Direction) -> String {
        if direction.target() != "zh" || self.abbreviations.is_empty() {
            return text.to_string();
        }

        if let Some(term) = self.abbreviations.get(&text.trim().to_uppercase()) {
            return term.to_string();
        }

        let term_for = |code: &str| {
            let code = code.to_uppercase();
            self.abbreviations.get(&code).map(str::to_string).unwrap_or(code)
        };

        let out = DIMENSION_VALUE.replace_all(text, |caps: &regex::Captures| {
            format!("{}:{}", term_for(&caps[1]), &caps[2])
        });
        let out = DIMENSION_PAIR.replace_all(&out, |caps: &regex::Captures| {
            format!("{}{}×{}{}", term_for(&caps[1]), &caps[2], term_for(&caps[3]), &caps[4])
        });
        out.into_owned()
    }

    /// Hint listing up to three known terms found in `text`
    pub fn context_hint(&self, text: &str, direction: Direction) -> Option<String> {
        let table = self.context.get(&direction)?;
        let hints: Vec<String> = table
            .iter()
            .filter(|(term, _)| !term.is_empty() && text.contains(term))
            .take(MAX_HINTS)
            .map(|(term, translation)| format!("{}={}", term, translation))
            .collect();
        if hints.is_empty() {
            None
        } else {
            Some(format!("{}: {}.", HINT_LABEL, hints.join("; ")))
        }
    }

    /// Clean up backend output: drop a leaked hint echo, apply corrections,
    /// collapse whitespace
    pub fn postprocess(&self, output: &str, direction: Direction) -> String {
        let mut text = output.to_string();

        let hint_marker = format!("{}:", HINT_LABEL);
        let source_marker = format!("{}:", SOURCE_LABEL);
        if text.contains(&hint_marker) && text.contains(&source_marker) {
            if let Some((_, tail)) = text.rsplit_once(&source_marker) {
                text = tail.trim().to_string();
            }
        }
        text = LEAKED_HINT.replace_all(&text, "").into_owned();

        if let Some(corrections) = self.corrections.get(&direction) {
            for (pattern, right) in corrections {
                text = pattern.replace_all(&text, regex::NoExpand(right.as_str())).into_owned();
            }
        }

        WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
    }
}

/// Case-insensitive pattern for `term`, anchored on word boundaries where the
/// term itself starts or ends with a word character
fn whole_word_pattern(term: &str) -> String {
    let is_word = |c: char| (c.is_alphanumeric() || c == '_') && !charclass::is_cjk_ideograph(c);
    let lead = term.chars().next().is_some_and(is_word);
    let trail = term.chars().last().is_some_and(is_word);
    format!(
        "(?i){}{}{}",
        if lead { r"\b" } else { "" },
        regex::escape(term),
        if trail { r"\b" } else { "" }
    )
}

fn builtin_corrections() -> GlossaryTable {
    GlossaryTable::new(BUILTIN_ZH_TO_FR_CORRECTIONS.iter().copied())
}

fn uppercase_keys(table: GlossaryTable) -> GlossaryTable {
    GlossaryTable::new(
        table
            .into_entries()
            .into_iter()
            .map(|(k, v)| (k.trim().to_uppercase(), v)),
    )
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Load a table that is expected to exist; warn when it does not
fn load_table(path: &Path) -> Option<GlossaryTable> {
    match read_file(path).and_then(|json| GlossaryTable::from_json_str(&json)) {
        Ok(table) => Some(table),
        Err(e) => {
            warn!("Glossary table disabled: {:#}", e);
            None
        }
    }
}

/// Load a per-direction table; absence is normal for most directions
fn load_optional_table(path: &Path) -> Option<GlossaryTable> {
    if !path.exists() {
        debug!("No glossary table at {}", path.display());
        return None;
    }
    load_table(path)
}
