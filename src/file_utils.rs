use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::errors::{DecodeError, SerializeError};

// @module: File and directory utilities

// @const: Timestamp suffix of generated output names, e.g. 14h05_160526
const OUTPUT_TIMESTAMP_FORMAT: &str = "%Hh%M_%d%m%y";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: `<target>_<stem>_<HHhMM_ddmmyy>.<ext>` next to the input
    // @params: input_file, target_language, extension (without dot), time
    pub fn timestamped_output_path<P: AsRef<Path>>(
        input_file: P,
        target_language: &str,
        extension: &str,
        now: DateTime<Local>,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let file_name = format!(
            "{}_{}_{}.{}",
            target_language,
            stem,
            now.format(OUTPUT_TIMESTAMP_FORMAT),
            extension.trim_start_matches('.')
        );
        input_file.with_file_name(file_name)
    }

    // @generates: Output path for a translated document
    // @params: input_file, output_dir (None = next to the input), target_language
    pub fn generate_output_path<P: AsRef<Path>>(
        input_file: P,
        output_dir: Option<&Path>,
        target_language: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let extension = input_file
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dxf".to_string());
        let path = Self::timestamped_output_path(input_file, target_language, &extension, Local::now());
        match (output_dir, path.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => path,
        }
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized_ext = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(normalized_ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Decode bytes with one encoding, failing on any malformed sequence
    pub fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
        let bytes = if encoding == UTF_8 {
            bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
        } else {
            bytes
        };
        encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
    }

    /// Resolve encoding labels, keeping order and dropping unknown labels
    pub fn resolve_encodings(labels: &[String]) -> Vec<&'static Encoding> {
        let mut encodings: Vec<&'static Encoding> = Vec::new();
        for label in labels {
            match Encoding::for_label(label.trim().as_bytes()) {
                Some(encoding) if !encodings.contains(&encoding) => encodings.push(encoding),
                Some(_) => {}
                None => debug!("Ignoring unknown encoding label '{}'", label),
            }
        }
        encodings
    }

    /// Read and parse a file with the first candidate encoding that works
    ///
    /// A candidate fails when the bytes are not valid in it or when `parse`
    /// rejects the decoded text.
    pub fn read_with_fallback<T, E, F>(
        path: &Path,
        labels: &[String],
        parse: F,
    ) -> Result<(T, &'static Encoding), DecodeError>
    where
        E: Display,
        F: Fn(&str) -> Result<T, E>,
    {
        let bytes = fs::read(path).map_err(|e| DecodeError {
            path: path.display().to_string(),
            attempts: vec![format!("read: {}", e)],
        })?;

        let mut attempts = Vec::new();
        for encoding in Self::resolve_encodings(labels) {
            debug!("Trying to read {} as {}", path.display(), encoding.name());
            let Some(text) = Self::decode_strict(&bytes, encoding) else {
                attempts.push(format!("{}: invalid byte sequence", encoding.name()));
                continue;
            };
            match parse(&text) {
                Ok(document) => {
                    info!("Read {} as {}", path.display(), encoding.name());
                    return Ok((document, encoding));
                }
                Err(e) => attempts.push(format!("{}: {}", encoding.name(), e)),
            }
        }

        if attempts.is_empty() {
            attempts.push("no usable encoding configured".to_string());
        }
        Err(DecodeError {
            path: path.display().to_string(),
            attempts,
        })
    }

    /// Write a file through a temporary sibling, so a failed save never
    /// leaves a truncated output behind
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<(), SerializeError> {
        let path = path.as_ref();
        let io_error = |message: String| SerializeError::Io {
            path: path.display().to_string(),
            message,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&dir).map_err(|e| io_error(e.to_string()))?;

        let mut file = NamedTempFile::new_in(&dir).map_err(|e| io_error(e.to_string()))?;
        file.write_all(content).map_err(|e| io_error(e.to_string()))?;
        file.flush().map_err(|e| io_error(e.to_string()))?;
        file.persist(path).map_err(|e| io_error(e.error.to_string()))?;
        Ok(())
    }
}
