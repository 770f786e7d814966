use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use tokio::time::Instant;

use super::{CaptureSource, Sample};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "studysync::capture";

use crate::{log_debug, log_warn};

/// Frames smaller than this are almost always a half-written file or a black frame.
pub const DEFAULT_MIN_FRAME_BYTES: usize = 1000;
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Reads the latest still an external grabber keeps overwriting at `path`
/// (for example `ffmpeg ... -update 1 latest.jpg`).
#[derive(Debug, Clone)]
pub struct FrameFileSource {
    path: PathBuf,
    min_frame_bytes: usize,
    jpeg_quality: u8,
}

impl FrameFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            min_frame_bytes: DEFAULT_MIN_FRAME_BYTES,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_min_frame_bytes(mut self, min_frame_bytes: usize) -> Self {
        self.min_frame_bytes = min_frame_bytes;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CaptureSource for FrameFileSource {
    async fn capture(&self) -> Option<Sample> {
        let started = Instant::now();
        let raw = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log_debug!("no frame at {} yet", self.path.display());
                return None;
            }
            Err(err) => {
                log_warn!("failed to read frame {}: {err}", self.path.display());
                return None;
            }
        };

        if raw.len() < self.min_frame_bytes {
            log_warn!(
                "frame too small ({} bytes) at {}, skipping",
                raw.len(),
                self.path.display()
            );
            return None;
        }

        let captured_at = Utc::now();
        let quality = self.jpeg_quality;
        let encoded = match tokio::task::spawn_blocking(move || reencode_jpeg(&raw, quality)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(err)) => {
                log_warn!("undecodable frame at {}: {err:#}", self.path.display());
                return None;
            }
            Err(err) => {
                log_warn!("frame encode worker join failed: {err}");
                return None;
            }
        };

        log_debug!(
            "captured {} bytes in {}ms",
            encoded.len(),
            started.elapsed().as_millis()
        );
        Some(Sample::new(captured_at, encoded))
    }
}

/// Decodes any format `image` understands and re-encodes as baseline RGB JPEG.
pub fn reencode_jpeg(raw: &[u8], quality: u8) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(raw).context("failed to decode frame")?;
    let rgb = decoded.to_rgb8();

    let mut out = Vec::with_capacity(raw.len());
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .context("failed to encode frame as JPEG")?;
    Ok(out)
}
