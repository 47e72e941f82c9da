/*!
 * Tests for glossary loading and text pre/post-processing
 */

use std::path::Path;

use doctrans::app_config::GlossaryConfig;
use doctrans::translation::{Direction, GlossaryStore};

use crate::common::{create_temp_dir, create_test_file};

fn config_for(dir: &Path) -> GlossaryConfig {
    GlossaryConfig {
        directory: dir.to_string_lossy().into_owned(),
        ..GlossaryConfig::default()
    }
}

fn bundled_glossary() -> GlossaryStore {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("glossary");
    GlossaryStore::load(&config_for(&dir))
}

#[test]
fn test_preprocess_withWidthValue_shouldExpandCode() {
    let glossary = bundled_glossary();
    assert_eq!(glossary.preprocess("W:800mm", Direction::FrToZh), "宽度:800mm");
}

#[test]
fn test_preprocess_withDimensionPair_shouldExpandBothCodes() {
    let glossary = bundled_glossary();
    assert_eq!(glossary.preprocess("W400*H650", Direction::FrToZh), "宽度400×高度650");
}

#[test]
fn test_preprocess_withFloorCode_shouldReplaceWholeString() {
    let glossary = bundled_glossary();
    assert_eq!(glossary.preprocess(" b2 ", Direction::FrToZh), "负二楼");
}

#[test]
fn test_preprocess_towardsFrench_shouldNotExpandCodes() {
    let glossary = bundled_glossary();
    assert_eq!(glossary.preprocess("W:800mm", Direction::ZhToFr), "W:800mm");
}

#[test]
fn test_preprocess_withKnownFrenchTerm_shouldSubstituteChineseTerm() {
    let glossary = bundled_glossary();
    assert_eq!(glossary.preprocess("faux plafond", Direction::FrToZh), "吊顶");
}

#[test]
fn test_contextHint_withSeveralTerms_shouldListAtMostThree() {
    let glossary = bundled_glossary();
    let hint = glossary.context_hint("天花板吊顶", Direction::ZhToFr).unwrap();
    assert_eq!(hint, "建筑术语: 吊顶=faux plafond; 天花板=plafond; 天花=plafond.");
    assert!(glossary.context_hint("porte", Direction::ZhToFr).is_none());
}

#[test]
fn test_load_withMissingDirectory_shouldDegradeToNoOp() {
    let dir = create_temp_dir().unwrap();
    let glossary = GlossaryStore::load(&config_for(&dir.path().join("absent")));

    assert_eq!(glossary.preprocess("W:800mm", Direction::FrToZh), "W:800mm");
    assert!(glossary.context_hint("吊顶", Direction::ZhToFr).is_none());
    // built-in corrections still apply
    assert_eq!(glossary.postprocess("plan de variole", Direction::ZhToFr), "plan de plafond");
}

#[test]
fn test_load_withCorrectionsFile_shouldApplyThemWholeWord() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "corrections_zh_to_en.json", r#"{"smallpox": "ceiling"}"#).unwrap();
    let glossary = GlossaryStore::load(&config_for(dir.path()));

    assert_eq!(glossary.postprocess("smallpox  plan", Direction::ZhToEn), "ceiling plan");
    assert_eq!(glossary.postprocess("smallpoxes", Direction::ZhToEn), "smallpoxes");
}

#[test]
fn test_load_withMalformedTable_shouldIgnoreIt() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "abbreviations.json", "{ not json").unwrap();
    let glossary = GlossaryStore::load(&config_for(dir.path()));
    assert_eq!(glossary.preprocess("W:800mm", Direction::FrToZh), "W:800mm");
}

#[test]
fn test_postprocess_withLeakedHint_shouldKeepOnlyTranslation() {
    let glossary = bundled_glossary();
    let output = "建筑术语: 吊顶=faux plafond.\n原文: faux plafond";
    assert_eq!(glossary.postprocess(output, Direction::ZhToFr), "faux plafond");
}
