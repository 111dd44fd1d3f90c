//! EXIF `UserComment` read/write for JPEG files.
//!
//! Writing goes through `little_exif`, which rewrites the APP1 segment and
//! keeps the other tags. Reading uses `kamadak-exif`.

use exif::{In, Reader, Tag, Value};
use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::PipelineError;

const ASCII_PREFIX: &[u8; 8] = b"ASCII\0\0\0";
const UNICODE_PREFIX: &[u8; 8] = b"UNICODE\0";

/// Encode text as a `UserComment` value with its 8-byte character code.
///
/// ASCII text is stored as-is, anything else as UTF-16LE.
pub(crate) fn encode_user_comment(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        let mut out = ASCII_PREFIX.to_vec();
        out.extend_from_slice(text.as_bytes());
        out
    } else {
        let mut out = UNICODE_PREFIX.to_vec();
        out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        out
    }
}

/// Decode a `UserComment` value. `little_endian` is the TIFF byte order,
/// used for UTF-16 text when the bytes themselves don't tell.
pub(crate) fn decode_user_comment(bytes: &[u8], little_endian: bool) -> String {
    let text = if bytes.len() < 8 {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        let (prefix, body) = bytes.split_at(8);
        if prefix == UNICODE_PREFIX {
            decode_utf16(body, little_endian)
        } else {
            String::from_utf8_lossy(body).into_owned()
        }
    };
    text.trim_end_matches(['\0', ' ']).to_string()
}

fn decode_utf16(body: &[u8], little_endian: bool) -> String {
    let le = guess_utf16_le(body).unwrap_or(little_endian);
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|c| {
            if le {
                u16::from_le_bytes([c[0], c[1]])
            } else {
                u16::from_be_bytes([c[0], c[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Mostly-Latin UTF-16 has a zero high byte in most code units, which gives
/// away the byte order.
fn guess_utf16_le(body: &[u8]) -> Option<bool> {
    let (mut even, mut odd) = (0usize, 0usize);
    for (i, b) in body.iter().enumerate() {
        if *b == 0 {
            if i % 2 == 0 {
                even += 1;
            } else {
                odd += 1;
            }
        }
    }
    match odd.cmp(&even) {
        std::cmp::Ordering::Greater => Some(true),
        std::cmp::Ordering::Less => Some(false),
        std::cmp::Ordering::Equal => None,
    }
}

/// Store `text` in the EXIF `UserComment` of a JPEG file.
pub fn embed(path: &Path, text: &str) -> Result<(), PipelineError> {
    let mut metadata = match Metadata::new_from_path(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("No usable EXIF in {:?} ({e}), writing a fresh block", path);
            Metadata::new()
        }
    };

    metadata.set_tag(ExifTag::UserComment(encode_user_comment(text)));
    metadata
        .write_to_file(path)
        .map_err(|e| PipelineError::Embed {
            path: path.to_path_buf(),
            message: format!("Failed to write EXIF: {e}"),
        })
}

/// Read the EXIF `UserComment` of a JPEG file.
pub fn read(path: &Path) -> Result<Option<String>, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::Embed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut reader = BufReader::new(file);

    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(e) => {
            return Err(PipelineError::Embed {
                path: path.to_path_buf(),
                message: format!("Failed to read EXIF: {e}"),
            })
        }
    };

    let comment = exif
        .get_field(Tag::UserComment, In::PRIMARY)
        .and_then(|field| match &field.value {
            Value::Undefined(bytes, _) => Some(decode_user_comment(bytes, exif.little_endian())),
            _ => None,
        })
        .filter(|s| !s.is_empty());

    Ok(comment)
}
