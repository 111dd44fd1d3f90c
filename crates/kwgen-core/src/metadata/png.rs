//! `Keywords` text chunk read/write for PNG files.
//!
//! The file is decoded without transformations and re-encoded with the same
//! color type, bit depth, palette and transparency, so pixel data survives
//! unchanged. Other text chunks are carried over.

use png::{Decoder, Encoder, Transformations};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use crate::error::PipelineError;

/// Text chunk keyword the combined keyword string is stored under.
pub const KEYWORD: &str = "Keywords";

fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| (c as u32) <= 0xFF)
}

/// Re-encode PNG bytes with a `Keywords` chunk holding `text`.
pub(crate) fn embed_in_bytes(bytes: &[u8], text: &str) -> Result<Vec<u8>, String> {
    let mut decoder = Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(Transformations::IDENTITY);
    let mut reader = decoder.read_info().map_err(|e| e.to_string())?;

    let mut pixels = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut pixels).map_err(|e| e.to_string())?;
    pixels.truncate(frame.buffer_size());
    let info = reader.info();

    let mut out = Vec::with_capacity(bytes.len() + text.len() + 64);
    {
        let mut encoder = Encoder::new(&mut out, frame.width, frame.height);
        encoder.set_color(frame.color_type);
        encoder.set_depth(frame.bit_depth);
        if let Some(palette) = &info.palette {
            encoder.set_palette(palette.to_vec());
        }
        if let Some(trns) = &info.trns {
            encoder.set_trns(trns.to_vec());
        }
        if let Some(gamma) = info.source_gamma {
            encoder.set_source_gamma(gamma);
        }

        for chunk in &info.uncompressed_latin1_text {
            if chunk.keyword != KEYWORD {
                encoder
                    .add_text_chunk(chunk.keyword.clone(), chunk.text.clone())
                    .map_err(|e| e.to_string())?;
            }
        }
        for chunk in &info.compressed_latin1_text {
            if chunk.keyword != KEYWORD {
                if let Ok(text) = chunk.get_text() {
                    encoder
                        .add_itxt_chunk(chunk.keyword.clone(), text)
                        .map_err(|e| e.to_string())?;
                }
            }
        }
        for chunk in &info.utf8_text {
            if chunk.keyword != KEYWORD {
                if let Ok(text) = chunk.get_text() {
                    encoder
                        .add_itxt_chunk(chunk.keyword.clone(), text)
                        .map_err(|e| e.to_string())?;
                }
            }
        }

        if is_latin1(text) {
            encoder.add_text_chunk(KEYWORD.to_string(), text.to_string())
        } else {
            encoder.add_itxt_chunk(KEYWORD.to_string(), text.to_string())
        }
        .map_err(|e| e.to_string())?;

        let mut writer = encoder.write_header().map_err(|e| e.to_string())?;
        writer
            .write_image_data(&pixels)
            .map_err(|e| e.to_string())?;
        writer.finish().map_err(|e| e.to_string())?;
    }
    Ok(out)
}

/// Store `text` in a `Keywords` text chunk of a PNG file.
pub fn embed(path: &Path, text: &str) -> Result<(), PipelineError> {
    let embed_err = |message: String| PipelineError::Embed {
        path: path.to_path_buf(),
        message,
    };

    let bytes = std::fs::read(path).map_err(|e| embed_err(e.to_string()))?;
    let encoded = embed_in_bytes(&bytes, text).map_err(embed_err)?;

    // Write to a sibling temp file, then rename over the image.
    let tmp = path.with_extension("png.kwgen-tmp");
    std::fs::write(&tmp, encoded).map_err(|e| embed_err(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        embed_err(e.to_string())
    })
}

/// Read the `Keywords` text chunk of a PNG file.
///
/// Only chunks before the image data are inspected.
pub fn read(path: &Path) -> Result<Option<String>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::Embed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let reader = Decoder::new(BufReader::new(file))
        .read_info()
        .map_err(|e| PipelineError::Embed {
            path: path.to_path_buf(),
            message: format!("Failed to read PNG: {e}"),
        })?;
    let info = reader.info();

    if let Some(chunk) = info
        .uncompressed_latin1_text
        .iter()
        .find(|c| c.keyword == KEYWORD)
    {
        return Ok(Some(chunk.text.clone()));
    }
    if let Some(chunk) = info.utf8_text.iter().find(|c| c.keyword == KEYWORD) {
        return Ok(chunk.get_text().ok());
    }
    if let Some(chunk) = info
        .compressed_latin1_text
        .iter()
        .find(|c| c.keyword == KEYWORD)
    {
        return Ok(chunk.get_text().ok());
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_png;

    #[test]
    fn test_latin1_detection() {
        assert!(is_latin1("dk:sø, dk:strand"));
        assert!(!is_latin1("vi:bãi biển"));
    }

    #[test]
    fn test_embed_latin1_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png");
        let before = image::open(&path).unwrap().to_rgb8();

        embed(&path, "en:sea, dk:sø").unwrap();

        assert_eq!(read(&path).unwrap().as_deref(), Some("en:sea, dk:sø"));
        let after = image::open(&path).unwrap().to_rgb8();
        assert_eq!(before, after);
        assert!(!path.with_extension("png.kwgen-tmp").exists());
    }

    #[test]
    fn test_embed_unicode_uses_itxt_and_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png");

        embed(&path, "en:old").unwrap();
        embed(&path, "vi:bãi biển").unwrap();

        let file = File::open(&path).unwrap();
        let reader = Decoder::new(BufReader::new(file)).read_info().unwrap();
        let info = reader.info();
        assert!(info.uncompressed_latin1_text.iter().all(|c| c.keyword != KEYWORD));
        assert_eq!(info.utf8_text.iter().filter(|c| c.keyword == KEYWORD).count(), 1);

        assert_eq!(read(&path).unwrap().as_deref(), Some("vi:bãi biển"));
    }

    #[test]
    fn test_other_text_chunks_preserved() {
        let mut bytes = Vec::new();
        {
            let mut encoder = Encoder::new(&mut bytes, 2, 2);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            encoder
                .add_text_chunk("Author".to_string(), "Jo".to_string())
                .unwrap();
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0, 64, 128, 255]).unwrap();
        }

        let out = embed_in_bytes(&bytes, "en:grey").unwrap();

        let mut reader = Decoder::new(Cursor::new(&out)).read_info().unwrap();
        {
            let info = reader.info();
            assert_eq!(info.color_type, png::ColorType::Grayscale);
            let author = info
                .uncompressed_latin1_text
                .iter()
                .find(|c| c.keyword == "Author")
                .unwrap();
            assert_eq!(author.text, "Jo");
        }
        let mut pixels = vec![0; reader.output_buffer_size()];
        reader.next_frame(&mut pixels).unwrap();
        assert_eq!(&pixels[..4], &[0, 64, 128, 255]);
    }

    #[test]
    fn test_embed_rejects_non_png_bytes() {
        assert!(embed_in_bytes(b"not a png", "en:x").is_err());
    }
}
