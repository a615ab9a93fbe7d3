//! Tag writer backed by the lofty crate.
//!
//! Uses the file format's primary tag type (ID3v2 for MP3, Vorbis comments
//! for FLAC/OGG, MP4 atoms for M4A), creating the tag when the file has none.

use std::path::Path;

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag, TagExt};

use super::{TagError, TagReport, TagRequest};

/// Downloaded cover image
#[derive(Debug, Clone)]
struct CoverImage {
    data: Vec<u8>,
    mime_type: MimeType,
}

/// Writes tags with lofty and fetches cover art over HTTP
#[derive(Debug, Clone, Default)]
pub struct LoftyTagSink {
    http_client: reqwest::Client,
}

impl LoftyTagSink {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Write title/artist/album and, if available, the front cover.
    ///
    /// A cover art failure is reported as a warning; the text tags are still
    /// written.
    pub async fn write_tags(
        &self,
        path: &Path,
        request: &TagRequest,
    ) -> Result<TagReport, TagError> {
        let mut report = TagReport::default();

        let cover = match request.cover_art_url.as_deref() {
            Some(url) => match self.download_cover(url).await {
                Ok(cover) => Some(cover),
                Err(e) => {
                    tracing::warn!(url, "Cover art download failed: {}", e);
                    report.warnings.push(e.to_string());
                    None
                }
            },
            None => None,
        };

        let path = path.to_path_buf();
        let request = request.clone();

        // lofty does synchronous file I/O
        tokio::task::spawn_blocking(move || write_to_file(&path, &request, cover))
            .await
            .map_err(|e| TagError::Task(e.to_string()))??;

        Ok(report)
    }

    async fn download_cover(&self, url: &str) -> Result<CoverImage, TagError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| TagError::CoverArt(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TagError::CoverArt(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(mime_from_content_type)
            .unwrap_or(MimeType::Jpeg);

        let data = response
            .bytes()
            .await
            .map_err(|e| TagError::CoverArt(e.to_string()))?
            .to_vec();

        if data.is_empty() {
            return Err(TagError::CoverArt(format!("empty image from {}", url)));
        }

        Ok(CoverImage { data, mime_type })
    }
}

fn mime_from_content_type(content_type: &str) -> MimeType {
    match content_type.split(';').next().map(str::trim) {
        Some("image/png") => MimeType::Png,
        Some("image/gif") => MimeType::Gif,
        Some("image/bmp") => MimeType::Bmp,
        Some("image/tiff") => MimeType::Tiff,
        _ => MimeType::Jpeg,
    }
}

fn write_to_file(
    path: &Path,
    request: &TagRequest,
    cover: Option<CoverImage>,
) -> Result<(), TagError> {
    let display = path.display().to_string();

    let mut tagged_file = Probe::open(path)
        .and_then(|file| file.read())
        .map_err(|e| TagError::Read {
            path: display.clone(),
            message: e.to_string(),
        })?;

    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file.tag_mut(tag_type).ok_or_else(|| TagError::Write {
        path: display.clone(),
        message: format!("{:?} tag unavailable", tag_type),
    })?;

    tag.set_title(request.title.clone());
    tag.set_artist(request.artist.clone());
    tag.set_album(request.album.clone());

    if let Some(cover) = cover {
        tag.remove_picture_type(PictureType::CoverFront);
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(cover.mime_type),
            Some("Cover".to_string()),
            cover.data,
        ));
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| TagError::Write {
            path: display,
            message: e.to_string(),
        })?;

    Ok(())
}
