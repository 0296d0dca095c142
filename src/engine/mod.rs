//! The Gemini engine: image preparation, API invocation, and response
//! parsing wired together.
//!
//! Each request is an independent, stateless round trip. The only shared
//! state is rate-limit bookkeeping behind a mutex; concurrent requests
//! otherwise proceed independently. The engine never retries internally.

pub mod gemini;
pub mod image_prep;
pub mod mock;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::classifier::{self, ClassificationResult};
use crate::config::{EngineConfig, Task};
use crate::detector::{self, Detection};
use crate::error::ClassifyError;

pub use image_prep::prepare_image;

/// How long a quota rejection blocks further live requests.
const QUOTA_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct RateLimitState {
    last_request: Option<Instant>,
    quota_blocked_until: Option<Instant>,
}

/// Waste classification engine backed by the Gemini API.
///
/// Without an API key the engine serves deterministic mock responses so the
/// rest of the application can run locally and in CI.
pub struct GeminiEngine {
    config: EngineConfig,
    client: reqwest::Client,
    state: Mutex<RateLimitState>,
}

impl GeminiEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ClassifyError> {
        let client = gemini::build_api_client()?;
        Ok(GeminiEngine {
            config,
            client,
            state: Mutex::new(RateLimitState::default()),
        })
    }

    /// Build an engine from environment configuration.
    pub fn from_env() -> Result<Self, ClassifyError> {
        GeminiEngine::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether quota backoff is currently in effect.
    pub fn is_quota_exceeded(&self) -> bool {
        self.quota_wait_time() > Duration::ZERO
    }

    /// Remaining quota backoff, zero when requests are allowed.
    pub fn quota_wait_time(&self) -> Duration {
        let state = self.state.lock().expect("rate limit state poisoned");
        match state.quota_blocked_until {
            Some(until) => until.saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    /// Classify the waste items in an image.
    ///
    /// `region` optionally embeds local recycling rules into the prompt.
    pub async fn classify_image(
        &self,
        image_bytes: &[u8],
        region: Option<&str>,
    ) -> Result<ClassificationResult, ClassifyError> {
        info!("Starting image classification");

        let Some(api_key) = self.config.api_key.as_deref() else {
            warn!("No API key configured - using mock classification");
            return Ok(mock::mock_classification(Some(image_bytes)));
        };

        self.check_quota()?;

        let image_base64 = image_prep::prepare_image(image_bytes)?;
        let prompt = classifier::build_classification_prompt(region);

        let response_text = gemini::generate_content(
            &self.client,
            api_key,
            &self.config.model,
            &prompt,
            Some(&image_base64),
            Task::Classification,
            self.config.max_output_tokens,
        )
        .await
        .map_err(|e| self.note_quota(e))?;

        let result = classifier::parse_classification(&response_text)?;
        info!("Classification complete: {} item(s)", result.items.len());
        Ok(result)
    }

    /// Detect and locate waste objects in an image.
    ///
    /// Called from a live video path, so a request inside the minimum
    /// interval returns an empty batch instead of queueing.
    pub async fn detect_objects(
        &self,
        image_bytes: &[u8],
    ) -> Result<Vec<Detection>, ClassifyError> {
        info!("Starting object detection");

        let Some(api_key) = self.config.api_key.as_deref() else {
            warn!("No API key configured - using mock detection");
            return Ok(mock::mock_detections(Some(image_bytes)));
        };

        self.check_quota()?;
        if !self.try_acquire_interval() {
            warn!("Rate limited - returning empty detection batch");
            return Ok(Vec::new());
        }

        let image_base64 = image_prep::prepare_image(image_bytes)?;
        let prompt = classifier::prompts::build_detection_prompt();

        let response_text = gemini::generate_content(
            &self.client,
            api_key,
            &self.config.model,
            &prompt,
            Some(&image_base64),
            Task::Classification,
            self.config.max_output_tokens,
        )
        .await
        .map_err(|e| self.note_quota(e))?;

        let detections = detector::parse_detections(&response_text)?;
        info!("Parsed {} detection(s)", detections.len());
        Ok(detections)
    }

    /// Generate a free-text sustainability tip. Uses the higher tip
    /// temperature so repeated calls vary.
    pub async fn generate_tip(&self, topic: &str) -> Result<String, ClassifyError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Ok(mock::mock_tip(topic));
        };

        self.check_quota()?;

        let prompt = classifier::prompts::build_tip_prompt(topic);
        let tip = gemini::generate_content(
            &self.client,
            api_key,
            &self.config.model,
            &prompt,
            None,
            Task::TipGeneration,
            self.config.max_output_tokens,
        )
        .await
        .map_err(|e| self.note_quota(e))?;

        Ok(tip.trim().to_string())
    }

    fn check_quota(&self) -> Result<(), ClassifyError> {
        let wait = self.quota_wait_time();
        if wait > Duration::ZERO {
            let msg = format!("quota exceeded, retry in {}s", wait.as_secs().max(1));
            warn!("{}", msg);
            return Err(ClassifyError::UpstreamUnavailable(msg));
        }
        Ok(())
    }

    /// Record the request time; false when inside the minimum interval.
    fn try_acquire_interval(&self) -> bool {
        let mut state = self.state.lock().expect("rate limit state poisoned");
        let now = Instant::now();
        if let Some(last) = state.last_request {
            if now.duration_since(last) < self.config.min_request_interval {
                return false;
            }
        }
        state.last_request = Some(now);
        true
    }

    /// Start the quota backoff window when the failure is a quota rejection.
    fn note_quota(&self, err: ClassifyError) -> ClassifyError {
        if gemini::is_quota_error(&err) {
            warn!("API quota exceeded, backing off for {}s", QUOTA_BACKOFF.as_secs());
            let mut state = self.state.lock().expect("rate limit state poisoned");
            state.quota_blocked_until = Some(Instant::now() + QUOTA_BACKOFF);
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Category;

    fn mock_engine() -> GeminiEngine {
        GeminiEngine::new(EngineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_classify_without_key_returns_mock() {
        let engine = mock_engine();
        let result = engine.classify_image(b"fake image bytes", None).await.unwrap();
        assert!(!result.items.is_empty());
        assert!(result.items[0].confidence <= 100);
    }

    #[tokio::test]
    async fn test_classify_mock_is_deterministic() {
        let engine = mock_engine();
        let a = engine.classify_image(b"same bytes", None).await.unwrap();
        let b = engine.classify_image(b"same bytes", None).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_detect_without_key_returns_mock() {
        let engine = mock_engine();
        let detections = engine.detect_objects(b"fake image bytes").await.unwrap();
        assert!(!detections.is_empty());
        for det in detections {
            assert!(det.bounding_box.ymax <= 1000);
        }
    }

    #[tokio::test]
    async fn test_tip_without_key_mentions_topic() {
        let engine = mock_engine();
        let tip = engine.generate_tip("coffee cups").await.unwrap();
        assert!(tip.contains("coffee cups"));
    }

    #[tokio::test]
    async fn test_mock_mode_ignores_rate_limit() {
        // Mock responses are free; back-to-back calls must both succeed.
        let engine = mock_engine();
        engine.detect_objects(b"a").await.unwrap();
        let second = engine.detect_objects(b"a").await.unwrap();
        assert!(!second.is_empty());
    }

    #[test]
    fn test_quota_initially_clear() {
        let engine = mock_engine();
        assert!(!engine.is_quota_exceeded());
        assert_eq!(engine.quota_wait_time(), Duration::ZERO);
    }

    #[test]
    fn test_quota_error_starts_backoff() {
        let engine = mock_engine();
        let err = ClassifyError::UpstreamUnavailable("Gemini API error: 429 - quota".to_string());
        let returned = engine.note_quota(err);
        assert!(matches!(returned, ClassifyError::UpstreamUnavailable(_)));
        assert!(engine.is_quota_exceeded());
        assert!(engine.quota_wait_time() <= QUOTA_BACKOFF);
    }

    #[test]
    fn test_non_quota_error_does_not_block() {
        let engine = mock_engine();
        let err = ClassifyError::UpstreamUnavailable("timeout".to_string());
        engine.note_quota(err);
        assert!(!engine.is_quota_exceeded());
    }

    #[test]
    fn test_interval_acquired_once() {
        let engine = mock_engine();
        assert!(engine.try_acquire_interval());
        assert!(!engine.try_acquire_interval());
    }

    #[tokio::test]
    async fn test_quota_block_surfaces_as_upstream_error() {
        let mut config = EngineConfig::default();
        config.api_key = Some("test_key".to_string());
        let engine = GeminiEngine::new(config).unwrap();

        let quota = ClassifyError::UpstreamUnavailable("429".to_string());
        engine.note_quota(quota);

        let err = engine.classify_image(b"bytes", None).await.unwrap_err();
        assert!(matches!(err, ClassifyError::UpstreamUnavailable(_)));
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn test_mock_classification_categories_valid() {
        for seed in [b"a".as_slice(), b"bb", b"ccc", b"dddd", b"eeeee"] {
            let result = mock::mock_classification(Some(seed));
            for item in result.items {
                assert!(Category::parse(item.category.as_str()).is_some());
            }
        }
    }
}
