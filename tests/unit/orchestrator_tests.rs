/*!
 * Tests for the per-string translation pipeline
 */

use doctrans::errors::BackendError;
use doctrans::providers::mock::MockBackend;
use doctrans::text::{RawText, Sanitizer};
use doctrans::translation::{Direction, GlossaryStore, Outcome, SkipReason};

use crate::common::{adversarial_corpus, mock_orchestrator};

#[tokio::test]
async fn test_translateOne_withRepeatedText_shouldCallBackendOnce() {
    let backend = MockBackend::scripted(vec![Ok("plafond".to_string()), Ok("autre chose".to_string())]);
    let mut orch = mock_orchestrator(backend.clone(), GlossaryStore::new(), Direction::ZhToFr);
    let original = RawText::from("天花板");

    let first = orch.translate_one(&original, Direction::ZhToFr).await;
    let second = orch.translate_one(&original, Direction::ZhToFr).await;

    assert_eq!(first, "plafond");
    assert_eq!(first, second);
    assert_eq!(backend.call_count(), 1);
    let (hits, misses, _) = orch.cache_stats();
    assert_eq!((hits, misses), (1, 1));
}

#[tokio::test]
async fn test_translateItem_withDifferentRawTextsCleaningAlike_shouldCacheSeparately() {
    let backend = MockBackend::echo();
    let mut orch = mock_orchestrator(backend.clone(), GlossaryStore::new(), Direction::ZhToFr);

    let plain = orch.translate(&RawText::from("天花板")).await;
    let noisy = orch.translate(&RawText::from("天花板😀")).await;

    assert_eq!(plain.text, noisy.text);
    assert_eq!(noisy.outcome, Outcome::Translated);
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_translateOne_withNumbersAndSymbols_shouldNeverReachBackend() {
    let backend = MockBackend::echo();
    let mut orch = mock_orchestrator(backend.clone(), GlossaryStore::new(), Direction::FrToZh);
    let sanitizer = Sanitizer::new();

    for text in [
        "800",
        "1 200,50",
        "3*4",
        "3×4",
        "3x4",
        "12-34_56/7\\8",
        "45°",
        "10%",
        "(1)[2]{3}",
        "1:50;",
        "1.2.3",
    ] {
        let raw = RawText::from(text);
        let result = orch.translate_item(&raw, Direction::FrToZh).await;
        assert_eq!(result.text, sanitizer.clean(&raw), "changed {}", text);
        assert!(
            matches!(result.outcome, Outcome::Skipped(_) | Outcome::Cached),
            "dispatched {}",
            text
        );
    }
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_translateOne_withFailingBackend_shouldReturnCleanedOriginals() {
    let mut orch = mock_orchestrator(MockBackend::failing(), GlossaryStore::new(), Direction::ZhToFr);
    let sanitizer = Sanitizer::new();

    for raw in adversarial_corpus() {
        let result = orch.translate_one(&raw, Direction::ZhToFr).await;
        assert_eq!(result, sanitizer.clean(&raw), "unexpected result for {}", raw.escaped());
    }
}

#[tokio::test]
async fn test_translateItem_afterTransientFailure_shouldRetryOnNextCall() {
    let backend = MockBackend::scripted(vec![
        Err(BackendError::Quota("monthly limit".to_string())),
        Ok("plafond".to_string()),
    ]);
    let mut orch = mock_orchestrator(backend.clone(), GlossaryStore::new(), Direction::ZhToFr);
    let original = RawText::from("天花板");

    let first = orch.translate(&original).await;
    let second = orch.translate(&original).await;

    assert_eq!(first.text, "天花板");
    assert!(matches!(first.outcome, Outcome::Fallback(BackendError::Quota(_))));
    assert_eq!(second.text, "plafond");
    assert_eq!(second.outcome, Outcome::Translated);
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn test_translateItem_withNoisyAnswer_shouldCleanIt() {
    let backend = MockBackend::scripted(vec![Ok("  plafond😀 \u{0}".to_string())]);
    let mut orch = mock_orchestrator(backend, GlossaryStore::new(), Direction::ZhToFr);

    let result = orch.translate(&RawText::from("天花板")).await;

    assert_eq!(result.text, "plafond");
}

#[tokio::test]
async fn test_translateItem_withBlankText_shouldSkipWithoutCaching() {
    let backend = MockBackend::echo();
    let mut orch = mock_orchestrator(backend.clone(), GlossaryStore::new(), Direction::ZhToFr);
    let blank = RawText::from("   ");

    let first = orch.translate(&blank).await;
    let second = orch.translate(&blank).await;

    assert_eq!(first.outcome, Outcome::Skipped(SkipReason::Empty));
    assert_eq!(second.outcome, Outcome::Skipped(SkipReason::Empty));
    assert_eq!(second.text, "");
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_translateOne_withExplicitDirection_shouldUseItsLanguages() {
    let backend = MockBackend::echo();
    let mut orch = mock_orchestrator(backend.clone(), GlossaryStore::new(), Direction::ZhToFr);

    let result = orch.translate_one(&RawText::from("porte"), Direction::FrToZh).await;

    assert_eq!(result, "[zh] porte");
    let request = backend.last_request().unwrap();
    assert_eq!((request.source.as_str(), request.target.as_str()), ("fr", "zh"));
}
