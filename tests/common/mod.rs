/*!
 * Common test utilities for the doctrans test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;

use doctrans::app_config::{Config, TranslationBackendKind};
use doctrans::providers::mock::MockBackend;
use doctrans::text::RawText;
use doctrans::translation::{Direction, GlossaryStore, Orchestrator};

/// Route library logs to the test output; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Minimal drawing with a header, the given block definitions and entities
pub fn drawing(entities: &str, blocks: &str) -> String {
    format!(
        "  0\nSECTION\n  2\nHEADER\n  9\n$ACADVER\n  1\nAC1015\n  0\nENDSEC\n\
         \x20 0\nSECTION\n  2\nBLOCKS\n{}  0\nENDSEC\n\
         \x20 0\nSECTION\n  2\nENTITIES\n{}  0\nENDSEC\n  0\nEOF\n",
        blocks, entities
    )
}

/// Floor plan with two translatable texts, a dimension label, an attribute
/// carrying a lone surrogate escape and a named block
pub fn sample_plan() -> String {
    drawing(
        "  0\nTEXT\n  8\nA-ANNO\n 10\n0.0\n 20\n0.0\n  1\n天花板\n\
         \x20 0\nMTEXT\n  8\nA-ANNO\n  1\n\\H2.5;吊顶\n\
         \x20 0\nTEXT\n  8\nA-DIMS\n  1\n1200 x 600\n\
         \x20 0\nATTRIB\n  8\n0\n  1\n编号\\U+D800\n\
         \x20 0\nLINE\n  8\n0\n 10\n0.0\n 11\n5.0\n",
        "  0\nBLOCK\n  2\nDOOR\n  0\nTEXT\n  1\n门\n  0\nENDBLK\n",
    )
}

/// Configuration for offline runs: mock backend, no cooldown, glossary in `dir`
pub fn offline_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.translation.backend = TranslationBackendKind::Mock;
    config.translation.common.cooldown_ms = 0;
    config.glossary.directory = dir.join("glossary").to_string_lossy().into_owned();
    config
}

/// Orchestrator around a mock backend, without cooldown
pub fn mock_orchestrator(backend: MockBackend, glossary: GlossaryStore, direction: Direction) -> Orchestrator {
    Orchestrator::new(Box::new(backend), glossary, direction).with_cooldown(Duration::ZERO)
}

/// Strings built to trip every sanitizer pass
pub fn adversarial_corpus() -> Vec<RawText> {
    let mut corpus: Vec<RawText> = [
        "",
        "   ",
        "天花板",
        "天花板😀",
        "天😀花☀板",
        "plafond suspendu Ã©clairÃ©",
        "â€œbonjourâ€",
        "{plafond",
        "plafond}",
        "{{a",
        "}{",
        "<<plafond>>",
        "dit << oui   >> ok",
        "\\fSimSun|b0|i0|c134;天花板",
        "\\H2.5;\\C1;cote",
        "a\\nb\\tc",
        "C:\\\\dossier",
        "\\\\\\",
        "ligne\u{0}\u{7}\u{1b}[0m fin",
        "tab\tnew\nline\r\nend",
        "e\u{301}cole",
        "\u{301}\u{301}",
        "a 😀 b",
        "😀",
        "\u{feff}porte",
        "porte\u{200b}coupe-feu",
        "W:800mm",
        "W400*H650",
        "1200 x 600",
        "Ã",
        "\u{fffd}\u{fffd}",
        "  mixed   spaces\u{3000}全角  ",
        "Ã©😀{",
    ]
    .iter()
    .map(|s| RawText::from(*s))
    .collect();

    corpus.push(RawText::from(format!("{}x", "\\".repeat(32)).as_str()));
    corpus.push(RawText::from("\\".repeat(9).as_str()));
    corpus.push(RawText::from_utf16(vec![0xD800]));
    corpus.push(RawText::from_utf16(vec![0xDC00, 0x0061]));
    corpus.push(RawText::from_utf16(vec![0x5929, 0xD83D, 0x82B1]));
    corpus.push(RawText::from_utf16(vec![0xD83D, 0xDE00, 0xDC00, 0x007B]));
    corpus.push(RawText::from_utf16(vec![0x0065, 0xD800, 0x0301]));
    corpus
}
