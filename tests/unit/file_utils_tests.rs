/*!
 * Tests for file utilities and the encoding fallback
 */

use std::path::{Path, PathBuf};

use doctrans::document::{DxfDocument, HostDocument};
use doctrans::file_utils::FileManager;

use crate::common::{create_temp_dir, create_test_file, drawing};

fn default_encodings() -> Vec<String> {
    doctrans::Config::default().document.encodings
}

#[test]
fn test_readWithFallback_withLegacyCodePageDrawing_shouldOpen() {
    let dir = create_temp_dir().unwrap();
    let source = drawing("  0\nTEXT\n  1\nCafé\n", "");
    let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(&source);
    let path = create_test_file(dir.path(), "legacy.dxf", &bytes).unwrap();
    assert!(std::str::from_utf8(&bytes).is_err());

    let (document, encoding) =
        FileManager::read_with_fallback(&path, &default_encodings(), DxfDocument::parse).unwrap();

    assert_eq!(encoding.name(), "windows-1252");
    let element = document.text_elements()[0].id;
    assert_eq!(document.read_text(element).unwrap().to_string_lossy(), "Café");
}

#[test]
fn test_readWithFallback_withGbkDrawing_shouldUseGbk() {
    let dir = create_temp_dir().unwrap();
    let source = drawing("  0\nTEXT\n  1\n天花板\n", "");
    let (bytes, _, _) = encoding_rs::GBK.encode(&source);
    let path = create_test_file(dir.path(), "plan.dxf", &bytes).unwrap();

    let (document, encoding) =
        FileManager::read_with_fallback(&path, &default_encodings(), DxfDocument::parse).unwrap();

    assert_eq!(encoding.name(), "GBK");
    let element = document.text_elements()[0].id;
    assert_eq!(document.read_text(element).unwrap().to_string_lossy(), "天花板");
}

#[test]
fn test_readWithFallback_withUtf8Bom_shouldParse() {
    let dir = create_temp_dir().unwrap();
    let mut bytes = b"\xEF\xBB\xBF".to_vec();
    bytes.extend_from_slice(drawing("  0\nTEXT\n  1\nporte\n", "").as_bytes());
    let path = create_test_file(dir.path(), "bom.dxf", &bytes).unwrap();

    let (_, encoding) = FileManager::read_with_fallback(&path, &default_encodings(), DxfDocument::parse).unwrap();

    assert_eq!(encoding.name(), "UTF-8");
}

#[test]
fn test_readWithFallback_withMissingFile_shouldReportReadFailure() {
    let err = FileManager::read_with_fallback(Path::new("/nonexistent/plan.dxf"), &default_encodings(), DxfDocument::parse)
        .unwrap_err();
    assert_eq!(err.attempts.len(), 1);
    assert!(err.attempts[0].starts_with("read:"));
}

#[test]
fn test_generateOutputPath_withOutputDir_shouldPlaceFileThere() {
    let path = FileManager::generate_output_path("/plans/niveau 1.dxf", Some(Path::new("/out")), "zh");
    assert_eq!(path.parent(), Some(Path::new("/out")));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("zh_niveau 1_"), "{}", name);
    assert!(name.ends_with(".dxf"), "{}", name);
}

#[test]
fn test_generateOutputPath_withoutOutputDir_shouldStayNextToInput() {
    let path = FileManager::generate_output_path("/plans/rdc.dxf", None, "fr");
    assert_eq!(path.parent(), Some(Path::new("/plans")));
}

#[test]
fn test_findFiles_shouldRecurseAndSort() {
    let dir = create_temp_dir().unwrap();
    let nested = dir.path().join("etage");
    std::fs::create_dir_all(&nested).unwrap();
    create_test_file(&nested, "b.dxf", "").unwrap();
    create_test_file(dir.path(), "a.dxf", "").unwrap();
    create_test_file(dir.path(), "notes.txt", "").unwrap();

    let files = FileManager::find_files(dir.path(), "dxf").unwrap();

    let expected: Vec<PathBuf> = vec![dir.path().join("a.dxf"), nested.join("b.dxf")];
    assert_eq!(files, expected);
}
