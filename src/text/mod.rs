/*!
 * Text handling: raw/clean text types, character classes and the sanitizer.
 */

pub mod charclass;
pub mod raw;
pub mod sanitizer;

pub use raw::{CleanText, Piece, RawText};
pub use sanitizer::{clean, clean_for_log, CleanTrace, Pass, PassChange, Sanitizer};
