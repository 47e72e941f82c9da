/*!
 * # doctrans - drawing text translation between Chinese and French
 *
 * A Rust library that translates the text embedded in CAD drawings (DXF)
 * while keeping everything else in the file untouched.
 *
 * ## Features
 *
 * - Multi-pass text sanitizer that never lets a lone surrogate, control
 *   character or replacement marker reach an output
 * - Translation through pluggable backends:
 *   - Google web endpoint (no key)
 *   - DeepL API
 *   - OpenAI API
 *   - Anthropic API
 * - Glossary pre/post-processing: abbreviation expansion, context hints,
 *   domain corrections and a multi-language term map
 * - Per-run translation cache and eligibility filter
 * - Encoding fallback when reading legacy drawings
 * - CSV report of every translated element
 * - Whole-document translation through a remote document service
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `text`: Raw/clean text types and the sanitizer
 * - `translation`: Cache, eligibility, glossary, language and the orchestrator
 * - `providers`: Translation backend clients and the document service client
 * - `document`: Host document abstraction, DXF reader/writer and the walker
 * - `report`: Run tally and CSV report
 * - `file_utils`: File system operations and encoding fallback
 * - `app_controller`: Background worker and CLI-facing controller
 * - `language_utils`: Language code utilities
 * - `errors`: Error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod report;
pub mod text;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunEvent, RunSummary};
pub use document::{DocumentWalker, DxfDocument, HostDocument};
pub use errors::{BackendError, DecodeError, RunError, SerializeError, WriteBackError};
pub use report::RunReport;
pub use text::{CleanText, RawText, Sanitizer};
pub use translation::{Direction, Orchestrator, Outcome};
