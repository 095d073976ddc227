/*!
 * Tests for file system utilities
 */

use anyhow::Result;
use napisub::file_utils::FileManager;
use std::path::Path;

use crate::common;

/// Test output naming
#[test]
fn test_generateOutputPath_shouldUseStemLanguageAndSrt() {
    let path = FileManager::generate_output_path("/videos/movie.sub", "/out", "pl");
    assert_eq!(path, Path::new("/out/movie.pl.srt"));

    let path = FileManager::generate_output_path("movie.txt", "/out", "");
    assert_eq!(path, Path::new("/out/movie.srt"));
}

/// Test extension recognition
#[test]
fn test_isSubtitleFile_shouldRecognizeCaptionExtensions() {
    assert!(FileManager::is_subtitle_file("a.srt"));
    assert!(FileManager::is_subtitle_file("a.SUB"));
    assert!(FileManager::is_subtitle_file("a.txt"));
    assert!(FileManager::is_subtitle_file("a.mpl"));
    assert!(!FileManager::is_subtitle_file("a.mkv"));
    assert!(!FileManager::is_subtitle_file("noext"));
}

/// Test recursive discovery
#[test]
fn test_findSubtitleFiles_shouldWalkSubdirectoriesInOrder() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let nested = dir.path().join("season1");
    FileManager::ensure_dir(&nested)?;

    common::create_test_file(dir.path(), "b.sub", b"{1}{2}x")?;
    common::create_test_file(dir.path(), "a.txt", b"{1}{2}x")?;
    common::create_test_file(dir.path(), "video.mkv", b"binary")?;
    common::create_test_file(&nested, "e01.srt", common::SRT_SAMPLE.as_bytes())?;

    let files = FileManager::find_subtitle_files(dir.path())?;
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["a.txt", "b.sub", "e01.srt"]);
    Ok(())
}

/// Windows-1250 files are decoded
#[test]
fn test_readSubtitleText_withWindows1250_shouldDecodePolishLetters() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let bytes = [b'{', b'1', b'}', b'{', b'2', b'}', b'Z', b'a', 0xBF, 0xF3, 0xB3, 0xE6];
    let path = common::create_test_file(dir.path(), "pl.sub", &bytes)?;

    assert_eq!(FileManager::read_subtitle_text(&path)?, "{1}{2}Zażółć");
    Ok(())
}

/// Empty files are rejected
#[test]
fn test_readSubtitleText_withEmptyFile_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "empty.srt", b"")?;

    assert!(FileManager::read_subtitle_text(&path).is_err());
    Ok(())
}

/// Writing creates missing parents
#[test]
fn test_writeToFile_shouldCreateParents() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("deep").join("out.srt");

    FileManager::write_to_file(&path, "content")?;

    assert!(FileManager::file_exists(&path));
    assert!(FileManager::dir_exists(dir.path().join("deep")));
    assert_eq!(std::fs::read_to_string(&path)?, "content");
    Ok(())
}
