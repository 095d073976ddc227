/*!
 * Integration tests for converting caption files on disk
 */

use anyhow::Result;
use napisub::file_utils::FileManager;
use napisub::formats::{DEFAULT_FPS, convert_to_srt};
use napisub::subtitle_processor::CaptionDocument;

use crate::common;

/// Read, convert and write every caption file of a folder
#[test]
fn test_convertFolder_withMixedNotations_shouldWriteSrtFiles() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;

    common::create_test_file(input.path(), "movie.sub", common::MICRODVD_SAMPLE.as_bytes())?;
    common::create_test_file(input.path(), "mpl2.txt", b"[10][25]Pierwsza\n[30][45]Druga|linia\n")?;
    common::create_test_file(input.path(), "tmp.txt", b"00:00:01:Raz\n00:00:04:Dwa\n")?;
    common::create_test_file(input.path(), "notes.txt", b"not a caption")?;

    let mut written = Vec::new();
    for file in FileManager::find_subtitle_files(input.path())? {
        let text = FileManager::read_subtitle_text(&file)?;
        let Some(srt) = convert_to_srt(&text, DEFAULT_FPS) else {
            continue;
        };
        let target = FileManager::generate_output_path(&file, output.path(), "");
        FileManager::write_to_file(&target, &srt)?;
        written.push(target);
    }

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["movie.srt", "mpl2.srt", "tmp.srt"]);

    let mpl2 = CaptionDocument::parse_srt(&std::fs::read_to_string(output.path().join("mpl2.srt"))?)?;
    assert_eq!(mpl2.len(), 2);
    assert_eq!(mpl2.cues()[0].start_ms, 1000);
    assert_eq!(mpl2.cues()[1].text, "Druga\nlinia");

    let timecoded = CaptionDocument::parse_srt(&std::fs::read_to_string(output.path().join("tmp.srt"))?)?;
    assert_eq!(timecoded.cues()[0].end_ms, 3990);
    assert_eq!(timecoded.cues()[1].end_ms, 7000);
    Ok(())
}

/// Converted output converts to itself
#[test]
fn test_convertFile_twice_shouldBeStable() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let file = common::create_test_file(dir.path(), "movie.sub", common::MICRODVD_SAMPLE.as_bytes())?;

    let first = convert_to_srt(&FileManager::read_subtitle_text(&file)?, DEFAULT_FPS).unwrap();
    let second = convert_to_srt(&first, DEFAULT_FPS).unwrap();

    assert_eq!(first, second);
    Ok(())
}

/// Windows-1250 input ends up as UTF-8 output
#[test]
fn test_convertFile_withWindows1250_shouldWriteUtf8() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut bytes = b"{25}{50}".to_vec();
    bytes.extend_from_slice(&[0xA3, 0xF3, 0x9F, 0x6B, 0x61]);
    let file = common::create_test_file(dir.path(), "pl.sub", &bytes)?;

    let srt = convert_to_srt(&FileManager::read_subtitle_text(&file)?, 25.0).unwrap();
    let target = FileManager::generate_output_path(&file, dir.path(), "pl");
    FileManager::write_to_file(&target, &srt)?;

    let written = std::fs::read_to_string(&target)?;
    assert!(written.contains("Łóźka"));
    assert!(written.starts_with("1\n00:00:01,000 --> 00:00:02,000\n"));
    Ok(())
}
