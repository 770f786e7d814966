pub mod frame_file;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use frame_file::FrameFileSource;

/// One captured still and the moment it was taken. Never persisted.
#[derive(Debug, Clone)]
pub struct Sample {
    pub captured_at: DateTime<Utc>,
    /// JPEG-encoded frame, shared between the two analysis requests.
    pub frame: Arc<Vec<u8>>,
}

impl Sample {
    pub fn new(captured_at: DateTime<Utc>, frame: Vec<u8>) -> Self {
        Self {
            captured_at,
            frame: Arc::new(frame),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }
}

/// Grabs one frame from the live feed.
///
/// `None` means "no frame this tick" (device not ready, grab failed); it is
/// not an error and the caller simply skips the tick.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn capture(&self) -> Option<Sample>;
}
