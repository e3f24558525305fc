//!
//! # Avatar Pipeline
//!
//! Validation and normalization for uploaded avatar images. The upload step
//! returns a `Result` that the route inspects before touching storage; there
//! is no separate error-handling stage. Whatever arrives is normalized to a
//! fixed-size PNG so the fetch endpoint can always serve `image/png`.

use actix_multipart::Multipart;
use futures::TryStreamExt;
use image::imageops::FilterType;
use image::ImageOutputFormat;
use lazy_static::lazy_static;
use regex::Regex;
use std::io::Cursor;

use crate::error::AppError;

/// Hard cap on an uploaded avatar, in bytes.
pub const MAX_AVATAR_BYTES: usize = 1_000_000;

/// Stored avatars are square PNGs with this edge length.
pub const AVATAR_DIMENSION: u32 = 250;

lazy_static! {
    // Filename pattern only; the bytes are not sniffed. A mislabeled
    // non-image still fails when normalization tries to decode it.
    static ref AVATAR_FILENAME_REGEX: Regex = Regex::new(r"\.(jpg|jpeg|png)$").unwrap();
}

/// Checks an uploaded filename against the accepted extensions.
pub fn acceptable_filename(filename: &str) -> bool {
    AVATAR_FILENAME_REGEX.is_match(filename)
}

/// Reads the file out of a multipart payload.
///
/// The payload must contain a file field named `avatar` whose filename ends
/// in `.jpg`, `.jpeg` or `.png` and whose content fits within
/// [`MAX_AVATAR_BYTES`]. Other fields are skipped. Violations surface as
/// `AppError::BadRequest`.
pub async fn read_upload(mut payload: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(mut field) = payload.try_next().await? {
        if field.name() != "avatar" {
            continue;
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .map(|name| name.to_string())
            .ok_or_else(|| AppError::BadRequest("Please upload a file".into()))?;

        if !acceptable_filename(&filename) {
            return Err(AppError::BadRequest(
                "The file must either be a jpg, jpeg or png.".into(),
            ));
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if data.len() + chunk.len() > MAX_AVATAR_BYTES {
                return Err(AppError::BadRequest("File too large".into()));
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(data);
    }

    Err(AppError::BadRequest("Please upload a file".into()))
}

/// Normalizes accepted image bytes to a square PNG of [`AVATAR_DIMENSION`].
///
/// The image is cover-resized: scaled to fill the square and center-cropped,
/// so non-square inputs lose their edges rather than getting distorted.
pub fn normalize(bytes: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_to_fill(AVATAR_DIMENSION, AVATAR_DIMENSION, FilterType::Lanczos3);

    let mut out = Vec::new();
    resized.write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)?;

    Ok(out)
}
