/*!
 * Tests for the sanitizer
 */

use doctrans::text::{clean, RawText, Sanitizer};

use crate::common::adversarial_corpus;

#[test]
fn test_clean_withAdversarialCorpus_shouldBeIdempotent() {
    let sanitizer = Sanitizer::new();
    for raw in adversarial_corpus() {
        let once = sanitizer.clean(&raw);
        let twice = sanitizer.clean_str(&once);
        assert_eq!(once, twice, "not a fixed point for {}", raw.escaped());
    }
}

#[test]
fn test_clean_withAdversarialCorpus_shouldNeverEmitSurrogates() {
    let sanitizer = Sanitizer::new();
    for raw in adversarial_corpus() {
        let cleaned = sanitizer.clean(&raw);
        let units: Vec<u16> = cleaned.encode_utf16().collect();
        let reparsed = RawText::from_utf16(units);
        assert!(!reparsed.has_lone_surrogates(), "surrogate left for {}", raw.escaped());
        assert!(
            cleaned.chars().all(|c| !(0xD800..=0xDFFF).contains(&(c as u32))),
            "surrogate code point left for {}",
            raw.escaped()
        );
    }
}

#[test]
fn test_clean_withAdversarialCorpus_shouldRoundTripThroughUtf8() {
    let sanitizer = Sanitizer::new();
    for raw in adversarial_corpus() {
        let cleaned = sanitizer.clean(&raw);
        let bytes = cleaned.as_bytes().to_vec();
        let decoded = String::from_utf8(bytes).expect("clean text is valid UTF-8");
        assert_eq!(cleaned, decoded);
    }
}

#[test]
fn test_clean_withUnpairedLeadingBrace_shouldCloseIt() {
    assert_eq!(clean("{plafond"), "{plafond}");
}

#[test]
fn test_clean_withEmojiAfterIdeographs_shouldKeepIdeographs() {
    assert_eq!(clean("天花板😀"), "天花板");
}

#[test]
fn test_clean_withLoneSurrogateBetweenIdeographs_shouldJoinThem() {
    let raw = RawText::from_utf16(vec![0x5929, 0xD83D, 0x82B1]);
    assert_eq!(Sanitizer::new().clean(&raw), "天花");
}

#[test]
fn test_cleanTraced_withCleanInput_shouldReportNoChange() {
    let (cleaned, trace) = Sanitizer::new().clean_traced(&RawText::from("porte coupe-feu"));
    assert_eq!(cleaned, "porte coupe-feu");
    assert!(!trace.changed());
}

#[test]
fn test_scrub_withPictograph_shouldDropOnlyThePictograph() {
    let raw = RawText::from("  门😀 \\P");
    assert_eq!(Sanitizer::new().scrub(&raw), "  门 \\P");
}
