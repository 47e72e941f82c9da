/*!
 * Tests for the background worker and the controller
 */

use std::path::PathBuf;

use doctrans::app_controller::{Controller, RunEvent};
use doctrans::errors::RunError;

use crate::common::{create_temp_dir, create_test_file, offline_config, sample_plan};

#[tokio::test]
async fn test_spawn_withMockBackend_shouldFinishAndReport() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "plan.dxf", sample_plan()).unwrap();
    let output = dir.path().join("fr_plan.dxf");
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();

    let (handle, mut events) = controller.spawn(input, Some(output.clone()));
    let mut last = None;
    while let Some(event) = events.recv().await {
        last = Some(event);
    }
    let summary = handle.await.unwrap().unwrap();

    assert!(matches!(last, Some(RunEvent::Finished(_))));
    assert_eq!(summary.report.translated, 2);
    assert!(output.exists());
    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("  1\n[fr] 天花板\n"));
}

#[tokio::test]
async fn test_spawn_withMissingInput_shouldSendFailedEvent() {
    let dir = create_temp_dir().unwrap();
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();

    let (handle, mut events) = controller.spawn(dir.path().join("absent.dxf"), None);
    let mut received = Vec::new();
    while let Some(event) = events.recv().await {
        received.push(event);
    }
    let result = handle.await.unwrap();

    assert!(matches!(result, Err(RunError::Decode(_))));
    match received.last() {
        Some(RunEvent::Failed { stage, cause }) => {
            assert_eq!(stage, "decode");
            assert!(cause.contains("absent.dxf"));
        }
        other => panic!("expected a failure event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_spawn_twice_shouldKeepRunsIndependent() {
    let dir = create_temp_dir().unwrap();
    let first = create_test_file(dir.path(), "a.dxf", sample_plan()).unwrap();
    let second = create_test_file(dir.path(), "b.dxf", sample_plan()).unwrap();
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();

    let (handle_a, _events_a) = controller.spawn(first, Some(dir.path().join("a_out.dxf")));
    let (handle_b, _events_b) = controller.spawn(second, Some(dir.path().join("b_out.dxf")));
    let a = handle_a.await.unwrap().unwrap();
    let b = handle_b.await.unwrap().unwrap();

    // each run owns its cache, so neither sees the other's entries
    assert_eq!(a.report, b.report);
    assert_eq!(a.report.translated, 2);
}

#[tokio::test]
async fn test_run_withMissingInput_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();
    assert!(controller.run(PathBuf::from("/nonexistent/plan.dxf"), None).await.is_err());
}

#[tokio::test]
async fn test_runFolder_shouldTranslateEveryDrawing() {
    let input_dir = create_temp_dir().unwrap();
    let output_dir = create_temp_dir().unwrap();
    create_test_file(input_dir.path(), "rdc.dxf", sample_plan()).unwrap();
    create_test_file(input_dir.path(), "r1.DXF", sample_plan()).unwrap();
    create_test_file(input_dir.path(), "broken.dxf", "garbage").unwrap();
    create_test_file(input_dir.path(), "notes.txt", "ignored").unwrap();
    let controller = Controller::with_config(offline_config(input_dir.path())).unwrap();

    let summaries = controller
        .run_folder(input_dir.path().to_path_buf(), Some(output_dir.path().to_path_buf()))
        .await
        .unwrap();

    assert_eq!(summaries.len(), 2);
    for summary in &summaries {
        assert_eq!(summary.output.parent(), Some(output_dir.path()));
        assert!(summary.output.exists());
        let name = summary.output.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("fr_"), "{}", name);
    }
}

#[tokio::test]
async fn test_runFolder_withoutDrawings_shouldFail() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "notes.txt", "ignored").unwrap();
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();
    assert!(controller.run_folder(dir.path().to_path_buf(), None).await.is_err());
}

#[test]
fn test_runRemote_withMissingInput_shouldFailBeforeUpload() {
    let dir = create_temp_dir().unwrap();
    let controller = Controller::with_config(offline_config(dir.path())).unwrap();
    let result = tokio_test::block_on(controller.run_remote(dir.path().join("deck.pptx"), None, None));
    assert!(result.is_err());
}
