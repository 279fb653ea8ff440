//! Command entry points for a hosting UI
//!
//! Plain async functions over a shared [`AppState`], each returning
//! `Result<_, String>` so a desktop shell can expose them as-is.

use crate::config::AppConfig;
use crate::invoice::Invoice;
use crate::pipeline::{DictationPipeline, Feedback, PipelineConfig, PipelineStatus};
use crate::stt::{Language, TranscriptSegment};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Global application state
pub struct AppState {
    pub config: Arc<RwLock<AppConfig>>,
    pub pipeline: Arc<Mutex<Option<DictationPipeline>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            pipeline: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates the pipeline on first use
    async fn pipeline_or_init<'a>(
        &self,
        guard: &'a mut Option<DictationPipeline>,
    ) -> &'a mut DictationPipeline {
        let config = PipelineConfig::from(&*self.config.read().await);
        guard.get_or_insert_with(|| DictationPipeline::new(config))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Status response for the UI
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub language: String,
    pub is_listening: bool,
    pub item_count: usize,
    pub total: Decimal,
}

/// Starts dictation
///
/// `language` is an optional code ("fr", "en", "auto"); the configured
/// language is used when omitted.
pub async fn start_dictation(state: &AppState, language: Option<String>) -> Result<(), String> {
    let lang = match language {
        Some(code) => Language::from_code(&code),
        None => state.config.read().await.language(),
    };

    let mut pipeline_guard = state.pipeline.lock().await;
    let pipeline = state.pipeline_or_init(&mut pipeline_guard).await;
    pipeline.set_language(lang);
    pipeline.start().await.map_err(|e| e.to_string())?;

    tracing::info!("Dictation started");
    Ok(())
}

/// Stops dictation and returns the invoice once every queued segment is applied
pub async fn stop_dictation(state: &AppState) -> Result<Invoice, String> {
    let mut pipeline_guard = state.pipeline.lock().await;
    let pipeline = pipeline_guard
        .as_mut()
        .ok_or_else(|| "Pipeline not initialized".to_string())?;

    pipeline.stop().await.map_err(|e| e.to_string())?;

    tracing::info!("Dictation stopped");
    Ok(pipeline.snapshot())
}

/// Forwards one recognizer segment to the running pipeline
pub async fn submit_segment(state: &AppState, segment: TranscriptSegment) -> Result<(), String> {
    let pipeline_guard = state.pipeline.lock().await;
    let pipeline = pipeline_guard
        .as_ref()
        .ok_or_else(|| "Pipeline not initialized".to_string())?;

    pipeline.submit_segment(segment).await.map_err(|e| e.to_string())
}

/// Subscribes to command feedback, creating the pipeline if needed
pub async fn subscribe_feedback(state: &AppState) -> Result<broadcast::Receiver<Feedback>, String> {
    let mut pipeline_guard = state.pipeline.lock().await;
    let pipeline = state.pipeline_or_init(&mut pipeline_guard).await;
    Ok(pipeline.subscribe())
}

/// Returns the current application status
pub async fn get_status(state: &AppState) -> Result<StatusResponse, String> {
    let pipeline_guard = state.pipeline.lock().await;

    let response = if let Some(ref pipeline) = *pipeline_guard {
        let status = pipeline.status().await;
        let invoice = pipeline.snapshot();
        StatusResponse {
            status: status.as_str().to_string(),
            language: pipeline.config().language.code().to_string(),
            is_listening: status == PipelineStatus::Running,
            item_count: invoice.item_count(),
            total: invoice.total,
        }
    } else {
        StatusResponse {
            status: "not_initialized".to_string(),
            language: state.config.read().await.language().code().to_string(),
            is_listening: false,
            item_count: 0,
            total: Decimal::ZERO,
        }
    };

    Ok(response)
}

/// Returns the latest invoice snapshot
pub async fn get_invoice(state: &AppState) -> Result<Invoice, String> {
    let pipeline_guard = state.pipeline.lock().await;
    pipeline_guard
        .as_ref()
        .map(DictationPipeline::snapshot)
        .ok_or_else(|| "Pipeline not initialized".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn final_segment(text: &str) -> TranscriptSegment {
        TranscriptSegment {
            text: text.to_string(),
            is_final: true,
            confidence: 0.95,
        }
    }

    #[tokio::test]
    async fn status_before_first_start() {
        let state = AppState::default();
        let status = get_status(&state).await.expect("status");

        assert_eq!(status.status, "not_initialized");
        assert_eq!(status.language, "auto");
        assert!(!status.is_listening);
        assert!(get_invoice(&state).await.is_err());
        assert!(submit_segment(&state, final_segment("add x at 1")).await.is_err());
    }

    #[tokio::test]
    async fn dictation_round_trip() {
        let state = AppState::default();
        let mut feedback = subscribe_feedback(&state).await.expect("subscribe");

        start_dictation(&state, Some("en".to_string())).await.expect("start");
        let status = get_status(&state).await.expect("status");
        assert!(status.is_listening);
        assert_eq!(status.language, "en");

        submit_segment(&state, final_segment("Add 5 units of paint at 20 each"))
            .await
            .expect("submit");
        submit_segment(
            &state,
            TranscriptSegment {
                text: "set tax".to_string(),
                is_final: false,
                confidence: 0.3,
            },
        )
        .await
        .expect("submit partial");
        submit_segment(&state, final_segment("set tax to 10%"))
            .await
            .expect("submit");

        let invoice = stop_dictation(&state).await.expect("stop");
        assert_eq!(invoice.total, Decimal::from(110));
        assert_eq!(get_invoice(&state).await.expect("invoice"), invoice);

        assert!(feedback.recv().await.expect("feedback").is_applied());
        assert!(feedback.recv().await.expect("feedback").is_applied());
        assert!(feedback.try_recv().is_err());

        let status = get_status(&state).await.expect("status");
        assert_eq!(status.status, "stopped");
        assert_eq!(status.item_count, 1);
    }

    #[tokio::test]
    async fn configured_language_is_the_default() {
        let state = AppState::with_config(AppConfig {
            language: "fr".to_string(),
            ..AppConfig::default()
        });
        let mut feedback = subscribe_feedback(&state).await.expect("subscribe");

        start_dictation(&state, None).await.expect("start");
        submit_segment(&state, final_segment("add 3 chairs at 40"))
            .await
            .expect("submit");
        stop_dictation(&state).await.expect("stop");

        assert!(matches!(
            feedback.recv().await.expect("feedback"),
            Feedback::Unrecognized { .. }
        ));
    }

    #[tokio::test]
    async fn double_start_is_reported() {
        let state = AppState::default();
        start_dictation(&state, None).await.expect("start");

        let err = start_dictation(&state, None).await.expect_err("already running");
        assert!(err.contains("already running"));
        stop_dictation(&state).await.expect("stop");
    }
}
