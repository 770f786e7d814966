use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::{timeout, Duration};

use super::loop_worker::TickHandler;
use crate::analysis::{AnalysisError, EmotionClient, EmotionOutcome, FocusClient, FocusOutcome, Outcome};
use crate::capture::CaptureSource;
use crate::models::{SessionId, StudyState};
use crate::state::{merge, StudyBoard};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "studysync::sampling::cycle";

use crate::{log_debug, log_info, log_warn};

/// The three collaborators a tick talks to.
#[derive(Clone)]
pub struct Pipeline {
    pub capture: Arc<dyn CaptureSource>,
    pub focus: Arc<dyn FocusClient>,
    pub emotion: Arc<dyn EmotionClient>,
}

#[derive(Debug, Clone, Copy)]
pub struct CycleLimits {
    pub capture_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for CycleLimits {
    fn default() -> Self {
        Self {
            capture_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub struct CycleResult {
    pub focus: FocusOutcome,
    pub emotion: EmotionOutcome,
    pub completed_at: DateTime<Utc>,
}

/// Capture -> fan out -> merge, for one session.
///
/// Owns the last merged state so the merge never reads shared ambient state.
pub struct AnalysisCycle {
    session_id: SessionId,
    pipeline: Pipeline,
    board: Arc<StudyBoard>,
    limits: CycleLimits,
    last_state: StudyState,
}

impl AnalysisCycle {
    pub fn new(
        session_id: SessionId,
        pipeline: Pipeline,
        board: Arc<StudyBoard>,
        limits: CycleLimits,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            pipeline,
            board,
            limits,
            last_state: StudyState::initial(started_at),
        }
    }
}

async fn within<T>(limit: Duration, call: impl Future<Output = Outcome<T>>) -> Outcome<T> {
    match timeout(limit, call).await {
        Ok(outcome) => outcome,
        Err(_) => Outcome::Failure(AnalysisError::Timeout(limit.as_millis() as u64).to_string()),
    }
}

#[async_trait]
impl TickHandler for AnalysisCycle {
    type Output = CycleResult;

    async fn run(&mut self) -> Option<CycleResult> {
        let sample = match timeout(self.limits.capture_timeout, self.pipeline.capture.capture()).await {
            Ok(Some(sample)) => sample,
            Ok(None) => {
                log_debug!("session {}: no frame available, skipping tick", self.session_id);
                return None;
            }
            Err(_) => {
                log_warn!(
                    "session {}: capture timed out (> {}ms), skipping tick",
                    self.session_id,
                    self.limits.capture_timeout.as_millis()
                );
                return None;
            }
        };

        let request_timeout = self.limits.request_timeout;
        let (focus, emotion) = tokio::join!(
            within(request_timeout, self.pipeline.focus.analyze(&sample, &self.session_id)),
            within(request_timeout, self.pipeline.emotion.classify(&sample)),
        );

        Some(CycleResult {
            focus,
            emotion,
            completed_at: Utc::now(),
        })
    }

    fn apply(&mut self, result: CycleResult) {
        let next = merge(&self.last_state, &result.focus, &result.emotion, result.completed_at);

        if let (Outcome::Failure(focus_err), Outcome::Failure(emotion_err)) = (&result.focus, &result.emotion) {
            log_warn!(
                "session {}: both analyses failed (focus: {focus_err}; emotion: {emotion_err}), carrying prior state",
                self.session_id
            );
        }
        log_info!(
            "session {}: focused={:?} emotion={} label=\"{}\" confidence={:.2}",
            self.session_id,
            next.focused,
            next.emotion.map(|e| e.as_str()).unwrap_or("-"),
            next.derived_label,
            next.confidence
        );

        self.board.publish(next.clone());
        self.last_state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{EmotionReading, FocusReading};
    use crate::capture::Sample;
    use crate::models::{DerivedLabel, Emotion};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoFrame;

    #[async_trait]
    impl CaptureSource for NoFrame {
        async fn capture(&self) -> Option<Sample> {
            None
        }
    }

    struct OneFrame;

    #[async_trait]
    impl CaptureSource for OneFrame {
        async fn capture(&self) -> Option<Sample> {
            Some(Sample::new(Utc::now(), vec![0xFF, 0xD8, 0xFF, 0xD9]))
        }
    }

    #[derive(Default)]
    struct CountingFocus {
        calls: AtomicUsize,
        hang: bool,
    }

    #[async_trait]
    impl FocusClient for CountingFocus {
        async fn analyze(&self, _sample: &Sample, session_id: &SessionId) -> FocusOutcome {
            assert_eq!(session_id.as_str(), "42");
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Outcome::Success(FocusReading::new(true))
        }
    }

    #[derive(Default)]
    struct CountingEmotion {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmotionClient for CountingEmotion {
        async fn classify(&self, _sample: &Sample) -> EmotionOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Outcome::Success(EmotionReading::new("happy", 0.6))
        }
    }

    fn cycle(
        capture: Arc<dyn CaptureSource>,
        focus: Arc<CountingFocus>,
        emotion: Arc<CountingEmotion>,
        board: Arc<StudyBoard>,
    ) -> AnalysisCycle {
        AnalysisCycle::new(
            SessionId::new("42"),
            Pipeline {
                capture,
                focus,
                emotion,
            },
            board,
            CycleLimits {
                capture_timeout: Duration::from_millis(500),
                request_timeout: Duration::from_millis(1000),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn absent_frame_makes_no_calls() {
        let focus = Arc::new(CountingFocus::default());
        let emotion = Arc::new(CountingEmotion::default());
        let board = Arc::new(StudyBoard::new());
        let mut cycle = cycle(Arc::new(NoFrame), focus.clone(), emotion.clone(), board.clone());

        assert!(cycle.run().await.is_none());
        assert_eq!(focus.calls.load(Ordering::SeqCst), 0);
        assert_eq!(emotion.calls.load(Ordering::SeqCst), 0);
        assert!(board.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_focus_call_times_out_without_blocking_emotion() {
        let focus = Arc::new(CountingFocus {
            hang: true,
            ..Default::default()
        });
        let emotion = Arc::new(CountingEmotion::default());
        let board = Arc::new(StudyBoard::new());
        let mut cycle = cycle(Arc::new(OneFrame), focus.clone(), emotion.clone(), board.clone());

        let result = cycle.run().await.expect("frame was captured");
        assert!(matches!(result.focus, Outcome::Failure(ref reason) if reason.contains("timed out")));
        assert!(result.emotion.is_success());

        cycle.apply(result);
        let live = board.current().expect("state published");
        assert_eq!(live.focused, None);
        assert_eq!(live.emotion, Some(Emotion::Happy));
        assert_eq!(live.derived_label, DerivedLabel::MotivatedEngaged);
        assert_eq!(board.history().len(), 1);
    }
}
