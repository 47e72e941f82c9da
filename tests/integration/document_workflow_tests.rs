/*!
 * End-to-end tests: read a drawing, translate it, save it and its report
 */

use std::fs;

use tokio::sync::mpsc;

use doctrans::app_controller::{translate_document, RunEvent, RunStage};
use doctrans::document::{DxfDocument, HostDocument};
use doctrans::errors::RunError;
use doctrans::providers::mock::MockBackend;
use doctrans::translation::{Direction, GlossaryStore};

use crate::common::{create_temp_dir, init_test_logging, create_test_file, mock_orchestrator, offline_config, sample_plan};

#[tokio::test]
async fn test_translateDocument_withSamplePlan_shouldWriteTranslatedDrawing() {
    init_test_logging();
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "plan.dxf", sample_plan()).unwrap();
    let output = dir.path().join("out").join("fr_plan.dxf");
    let config = offline_config(dir.path());
    let backend = MockBackend::scripted(vec![Ok("plafond".to_string()), Ok("faux plafond".to_string())]);
    let mut orch = mock_orchestrator(backend.clone(), GlossaryStore::new(), Direction::ZhToFr);
    let (sender, _receiver) = mpsc::unbounded_channel();

    let summary = translate_document(&config, &mut orch, &input, Some(output.clone()), &sender)
        .await
        .unwrap();

    assert_eq!(summary.output, output);
    assert_eq!(summary.encoding, "UTF-8");
    assert_eq!(summary.report.total, 3);
    assert_eq!(summary.report.translated, 2);
    assert_eq!(summary.report.skipped, 1);
    assert_eq!(summary.report.fallback, 0);
    assert_eq!(summary.report.swept, 1);
    assert_eq!(backend.call_count(), 2);

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("  1\nplafond\n"));
    assert!(written.contains("  1\n{\\fSimSun|b0|i0|c134;faux plafond}\n"));
    assert!(written.contains("  1\n1200 x 600\n"));
    assert!(written.contains("  1\n编号\n"));
    assert!(written.contains("  1\n门\n"));
    assert!(written.contains("  0\nLINE\n  8\n0\n 10\n0.0\n 11\n5.0\n"));
    assert!(DxfDocument::parse(&written).is_ok());

    // input is never modified
    assert_eq!(fs::read_to_string(&input).unwrap(), sample_plan());
}

#[tokio::test]
async fn test_translateDocument_shouldWriteCsvReportNextToOutput() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "plan.dxf", sample_plan()).unwrap();
    let output = dir.path().join("fr_plan.dxf");
    let config = offline_config(dir.path());
    let backend = MockBackend::scripted(vec![Ok("plafond".to_string()), Ok("faux plafond".to_string())]);
    let mut orch = mock_orchestrator(backend, GlossaryStore::new(), Direction::ZhToFr);
    let (sender, _receiver) = mpsc::unbounded_channel();

    let summary = translate_document(&config, &mut orch, &input, Some(output.clone()), &sender)
        .await
        .unwrap();

    let report_file = summary.report_file.unwrap();
    assert_eq!(report_file, dir.path().join("fr_plan_report.csv"));
    let bytes = fs::read(&report_file).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "layer,location,original_text,translated_text");
    assert_eq!(lines[1], "A-ANNO,modelspace,天花板,plafond");
}

#[tokio::test]
async fn test_translateDocument_withFailingBackend_shouldCompleteWithOriginals() {
    init_test_logging();
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "plan.dxf", sample_plan()).unwrap();
    let output = dir.path().join("fr_plan.dxf");
    let config = offline_config(dir.path());
    let mut orch = mock_orchestrator(MockBackend::failing(), GlossaryStore::new(), Direction::ZhToFr);
    let (sender, _receiver) = mpsc::unbounded_channel();

    let summary = translate_document(&config, &mut orch, &input, Some(output.clone()), &sender)
        .await
        .unwrap();

    assert_eq!(summary.report.fallback, 2);
    assert_eq!(summary.report.translated, 0);
    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("  1\n天花板\n"));
    assert!(written.contains("  1\n\\H2.5;吊顶\n"));
    // the lone surrogate is still swept away
    assert!(written.contains("  1\n编号\n"));
}

#[tokio::test]
async fn test_translateDocument_withIncludeBlocks_shouldTranslateNamedBlocks() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "plan.dxf", sample_plan()).unwrap();
    let output = dir.path().join("fr_plan.dxf");
    let mut config = offline_config(dir.path());
    config.document.include_blocks = true;
    let mut orch = mock_orchestrator(MockBackend::echo(), GlossaryStore::new(), Direction::ZhToFr);
    let (sender, _receiver) = mpsc::unbounded_channel();

    let summary = translate_document(&config, &mut orch, &input, Some(output.clone()), &sender)
        .await
        .unwrap();

    assert_eq!(summary.report.total, 4);
    assert_eq!(summary.report.translated, 3);
    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("  1\n[fr] 门\n"));
}

#[tokio::test]
async fn test_translateDocument_withCustomFont_shouldWrapRichText() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "plan.dxf", sample_plan()).unwrap();
    let output = dir.path().join("fr_plan.dxf");
    let mut config = offline_config(dir.path());
    config.document.font = "Arial".to_string();
    let backend = MockBackend::scripted(vec![Ok("plafond".to_string()), Ok("faux plafond".to_string())]);
    let mut orch = mock_orchestrator(backend, GlossaryStore::new(), Direction::ZhToFr);
    let (sender, _receiver) = mpsc::unbounded_channel();

    translate_document(&config, &mut orch, &input, Some(output.clone()), &sender)
        .await
        .unwrap();

    let document = DxfDocument::parse(&fs::read_to_string(&output).unwrap()).unwrap();
    let texts: Vec<String> = document
        .text_elements()
        .iter()
        .filter_map(|e| document.read_text(e.id).ok())
        .map(|t| t.to_string_lossy())
        .collect();
    assert!(texts.contains(&"{\\fArial|b0|i0|c134;faux plafond}".to_string()));
}

#[tokio::test]
async fn test_translateDocument_withUnreadableInput_shouldFailAtDecodeStage() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "broken.dxf", "this is not a drawing").unwrap();
    let output = dir.path().join("out.dxf");
    let config = offline_config(dir.path());
    let backend = MockBackend::echo();
    let mut orch = mock_orchestrator(backend.clone(), GlossaryStore::new(), Direction::ZhToFr);
    let (sender, _receiver) = mpsc::unbounded_channel();

    let err = translate_document(&config, &mut orch, &input, Some(output.clone()), &sender)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Decode(_)));
    assert_eq!(err.stage(), "decode");
    assert!(!output.exists());
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_translateDocument_withUnwritableOutput_shouldFailAtSerializeStage() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "plan.dxf", sample_plan()).unwrap();
    let blocker = create_test_file(dir.path(), "blocker", "a file, not a directory").unwrap();
    let config = offline_config(dir.path());
    let mut orch = mock_orchestrator(MockBackend::echo(), GlossaryStore::new(), Direction::ZhToFr);
    let (sender, _receiver) = mpsc::unbounded_channel();

    let err = translate_document(&config, &mut orch, &input, Some(blocker.join("out.dxf")), &sender)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Serialize(_)));
    assert_eq!(err.stage(), "serialize");
}

#[tokio::test]
async fn test_translateDocument_shouldEmitEventsInOrder() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "plan.dxf", sample_plan()).unwrap();
    let output = dir.path().join("fr_plan.dxf");
    let config = offline_config(dir.path());
    let mut orch = mock_orchestrator(MockBackend::echo(), GlossaryStore::new(), Direction::ZhToFr);
    let (sender, mut receiver) = mpsc::unbounded_channel();

    translate_document(&config, &mut orch, &input, Some(output), &sender)
        .await
        .unwrap();
    drop(sender);

    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 6);
    assert_eq!(events[0], RunEvent::Stage(RunStage::Reading));
    assert_eq!(events[1], RunEvent::Stage(RunStage::Translating));
    assert!(matches!(&events[2], RunEvent::Progress { done: 1, total: 2, .. }));
    assert!(matches!(&events[3], RunEvent::Progress { done: 2, total: 2, outcome, .. } if outcome == "translated"));
    assert_eq!(events[4], RunEvent::Stage(RunStage::Saving));
    assert!(matches!(&events[5], RunEvent::Finished(summary) if summary.report.translated == 2));
}
