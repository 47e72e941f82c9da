/*!
 * Translation of individual strings.
 *
 * - `language`: translation directions and per-run language settings
 * - `glossary`: abbreviation, context hint, correction and term tables
 * - `cache`: per-run cache keyed by the raw original text
 * - `eligibility`: decides whether a string is worth sending to a backend
 * - `orchestrator`: composes the above with a backend into `translate_one`
 */

pub use self::cache::TranslationCache;
pub use self::eligibility::{SkipReason, Verdict};
pub use self::glossary::{GlossaryStore, GlossaryTable, TermEntry, TermMap};
pub use self::language::{Direction, LanguageConfig};
pub use self::orchestrator::{Orchestrator, Outcome, Translated};

pub mod cache;
pub mod eligibility;
pub mod glossary;
pub mod language;
pub mod orchestrator;
