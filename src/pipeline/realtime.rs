//! Live dictation pipeline
//!
//! Feeds transcript events to a [`Session`] on a background task, in arrival
//! order, and publishes the resulting feedback and invoice snapshots.

use super::session::{Feedback, Session};
use crate::command::CommandMatcher;
use crate::config::AppConfig;
use crate::invoice::{Invoice, DEFAULT_DUE_IN_DAYS};
use crate::stt::{Language, SttEvent, TranscriptSegment, TranscriptSource};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio::task::JoinHandle;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Rule locale
    pub language: Language,
    /// Payment terms for new invoices
    pub due_in_days: u32,
    /// Feedback broadcast capacity
    pub feedback_capacity: usize,
    /// Pending transcript events before `submit` waits
    pub segment_queue: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: Language::Auto,
            due_in_days: DEFAULT_DUE_IN_DAYS,
            feedback_capacity: 100,
            segment_queue: 32,
        }
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            language: config.language(),
            due_in_days: config.due_in_days,
            feedback_capacity: config.feedback_capacity.max(1),
            segment_queue: config.segment_queue.max(1),
        }
    }
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Segment is not final: '{0}'")]
    NotFinal(String),

    #[error("Pipeline already running")]
    AlreadyRunning,

    #[error("Pipeline not started")]
    NotRunning,

    #[error("Dictation worker failed: {0}")]
    Worker(String),

    #[error("Transcript source not ready: {0}")]
    SourceNotReady(String),
}

/// Pipeline state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
    Error(String),
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Stopped => "stopped",
            PipelineStatus::Starting => "starting",
            PipelineStatus::Running => "running",
            PipelineStatus::Stopping => "stopping",
            PipelineStatus::Error(_) => "error",
        }
    }
}

/// Dictation pipeline around a single invoice session
pub struct DictationPipeline {
    config: PipelineConfig,
    status: Arc<RwLock<PipelineStatus>>,
    feedback_tx: broadcast::Sender<Feedback>,
    snapshot_tx: watch::Sender<Invoice>,
    event_tx: Option<mpsc::Sender<SttEvent>>,
    worker: Option<JoinHandle<Session>>,
    /// Session parked while the pipeline is stopped
    session: Option<Session>,
}

impl DictationPipeline {
    /// Creates a stopped pipeline with an empty invoice issued today
    pub fn new(config: PipelineConfig) -> Self {
        let session = Self::fresh_session(&config);
        Self::with_session(session, config)
    }

    /// Creates a stopped pipeline around an existing session
    pub fn with_session(session: Session, config: PipelineConfig) -> Self {
        let (feedback_tx, _) = broadcast::channel(config.feedback_capacity.max(1));
        let (snapshot_tx, _) = watch::channel(session.snapshot());

        Self {
            config,
            status: Arc::new(RwLock::new(PipelineStatus::Stopped)),
            feedback_tx,
            snapshot_tx,
            event_tx: None,
            worker: None,
            session: Some(session),
        }
    }

    fn fresh_session(config: &PipelineConfig) -> Session {
        let invoice = Invoice::with_terms(Local::now().date_naive(), config.due_in_days);
        Session::new(invoice, CommandMatcher::new(config.language.clone()))
    }

    /// Starts the worker task
    pub async fn start(&mut self) -> Result<(), PipelineError> {
        {
            let status = self.status.read().await;
            if *status == PipelineStatus::Running {
                return Err(PipelineError::AlreadyRunning);
            }
        }

        {
            let mut status = self.status.write().await;
            *status = PipelineStatus::Starting;
        }

        let mut session = match self.session.take() {
            Some(session) => session,
            None => {
                let session = Self::fresh_session(&self.config);
                self.snapshot_tx.send_replace(session.snapshot());
                session
            }
        };
        session.set_language(self.config.language.clone());

        let (event_tx, mut event_rx) = mpsc::channel::<SttEvent>(self.config.segment_queue.max(1));
        let feedback_tx = self.feedback_tx.clone();
        let snapshot_tx = self.snapshot_tx.clone();

        let worker = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if let Some(feedback) = session.handle_event(event) {
                    if feedback.is_applied() {
                        snapshot_tx.send_replace(session.snapshot());
                    }
                    // No subscriber is fine
                    let _ = feedback_tx.send(feedback);
                }
            }
            session
        });

        self.event_tx = Some(event_tx);
        self.worker = Some(worker);

        {
            let mut status = self.status.write().await;
            *status = PipelineStatus::Running;
        }

        tracing::info!("Dictation started ({})", self.config.language.code());
        Ok(())
    }

    /// Stops accepting events, lets the worker finish queued ones and parks the session
    pub async fn stop(&mut self) -> Result<(), PipelineError> {
        {
            let status = self.status.read().await;
            if *status == PipelineStatus::Stopped {
                return Ok(());
            }
        }

        {
            let mut status = self.status.write().await;
            *status = PipelineStatus::Stopping;
        }

        // Closing the queue ends the worker loop once it is drained
        drop(self.event_tx.take());

        if let Some(worker) = self.worker.take() {
            match worker.await {
                Ok(session) => {
                    tracing::info!("Dictation stopped after {} segments", session.processed());
                    self.session = Some(session);
                }
                Err(e) => {
                    tracing::error!("Dictation worker failed: {}", e);
                    let mut status = self.status.write().await;
                    *status = PipelineStatus::Error(e.to_string());
                    return Err(PipelineError::Worker(e.to_string()));
                }
            }
        }

        {
            let mut status = self.status.write().await;
            *status = PipelineStatus::Stopped;
        }

        Ok(())
    }

    /// Queues a transcript event, waiting while the queue is full
    pub async fn submit(&self, event: SttEvent) -> Result<(), PipelineError> {
        let event_tx = self.event_tx.as_ref().ok_or(PipelineError::NotRunning)?;
        event_tx
            .send(event)
            .await
            .map_err(|_| PipelineError::Worker("event queue closed".to_string()))
    }

    /// Queues a recognizer segment; non-final segments are display-only
    pub async fn submit_segment(&self, segment: TranscriptSegment) -> Result<(), PipelineError> {
        self.submit(SttEvent::from(segment)).await
    }

    /// Drains every pending event of `source` into the pipeline
    pub async fn forward_from<S>(&self, source: &mut S) -> Result<usize, PipelineError>
    where
        S: TranscriptSource + ?Sized,
    {
        if !source.is_ready() {
            return Err(PipelineError::SourceNotReady(source.name().to_string()));
        }
        tracing::debug!(
            "Forwarding from {} ({}), rules: {}",
            source.name(),
            source.language().code(),
            self.config.language.code()
        );

        let mut forwarded = 0;
        while let Some(event) = source.poll() {
            self.submit(event).await?;
            forwarded += 1;
        }
        tracing::debug!("Forwarded {} transcript events from {}", forwarded, source.name());
        Ok(forwarded)
    }

    /// Subscribes to feedback
    pub fn subscribe(&self) -> broadcast::Receiver<Feedback> {
        self.feedback_tx.subscribe()
    }

    /// Subscribes to invoice snapshots
    pub fn watch_invoice(&self) -> watch::Receiver<Invoice> {
        self.snapshot_tx.subscribe()
    }

    /// Latest published invoice
    pub fn snapshot(&self) -> Invoice {
        self.snapshot_tx.borrow().clone()
    }

    pub async fn status(&self) -> PipelineStatus {
        self.status.read().await.clone()
    }

    /// Changes the rule locale; a running pipeline picks it up on its next start
    pub fn set_language(&mut self, language: Language) {
        self.config.language = language.clone();
        if let Some(session) = self.session.as_mut() {
            session.set_language(language);
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;
    use crate::stt::{FinalSegment, MockTranscriptSource};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn final_event(text: &str) -> SttEvent {
        SttEvent::Final(FinalSegment::new(text, 0.9))
    }

    fn pipeline() -> DictationPipeline {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date");
        let session = Session::new(Invoice::new(today), CommandMatcher::default()).with_clock(move || today);
        DictationPipeline::with_session(session, PipelineConfig::default())
    }

    #[tokio::test]
    async fn applies_events_in_arrival_order() {
        let mut pipeline = pipeline();
        let mut feedback = pipeline.subscribe();
        pipeline.start().await.expect("start");

        pipeline.submit(final_event("add 2 chairs at 40")).await.expect("submit");
        pipeline.submit(final_event("change the quantity of item 1 to 3")).await.expect("submit");
        pipeline.stop().await.expect("stop");

        assert!(feedback.recv().await.expect("feedback").is_applied());
        assert!(feedback.recv().await.expect("feedback").is_applied());

        let invoice = pipeline.snapshot();
        assert_eq!(invoice.items[0].quantity, Decimal::from(3));
        assert_eq!(invoice.total, Decimal::from(120));
        assert_eq!(pipeline.status().await, PipelineStatus::Stopped);
    }

    #[tokio::test]
    async fn partial_events_produce_no_feedback() {
        let mut pipeline = pipeline();
        let mut feedback = pipeline.subscribe();
        pipeline.start().await.expect("start");

        pipeline
            .submit(SttEvent::Partial("add 2 chairs".to_string()))
            .await
            .expect("submit");
        pipeline.submit(final_event("show preview")).await.expect("submit");
        pipeline.stop().await.expect("stop");

        assert_eq!(
            feedback.recv().await.expect("feedback"),
            Feedback::Navigate {
                target: CommandKind::ShowPreview,
                utterance: "show preview".to_string(),
            }
        );
        assert!(feedback.try_recv().is_err());
    }

    #[tokio::test]
    async fn start_twice_fails_and_submit_requires_running() {
        let mut pipeline = pipeline();

        assert!(matches!(
            pipeline.submit(final_event("add x at 1")).await,
            Err(PipelineError::NotRunning)
        ));

        pipeline.start().await.expect("start");
        assert!(matches!(pipeline.start().await, Err(PipelineError::AlreadyRunning)));
        pipeline.stop().await.expect("stop");
        pipeline.stop().await.expect("stopping twice is fine");
    }

    #[tokio::test]
    async fn invoice_survives_restart() {
        let mut pipeline = pipeline();

        pipeline.start().await.expect("start");
        pipeline.submit(final_event("add paint at 20")).await.expect("submit");
        pipeline.stop().await.expect("stop");

        pipeline.start().await.expect("restart");
        pipeline.submit(final_event("add brush at 5")).await.expect("submit");
        pipeline.stop().await.expect("stop");

        assert_eq!(pipeline.snapshot().item_count(), 2);
        assert_eq!(pipeline.snapshot().subtotal, Decimal::from(25));
    }

    #[tokio::test]
    async fn oversized_amounts_do_not_stop_the_worker() {
        let mut pipeline = pipeline();
        let mut feedback = pipeline.subscribe();
        pipeline.start().await.expect("start");

        pipeline.submit(final_event("add paint at 20")).await.expect("submit");
        pipeline
            .submit(final_event("add 1000000000000000000000000000 bolts at 1000"))
            .await
            .expect("submit");
        pipeline.submit(final_event("add brush at 5")).await.expect("submit");
        pipeline.stop().await.expect("worker survives");

        assert!(feedback.recv().await.expect("feedback").is_applied());
        assert!(matches!(
            feedback.recv().await.expect("feedback"),
            Feedback::Rejected {
                kind: CommandKind::AddItem,
                ..
            }
        ));
        assert!(feedback.recv().await.expect("feedback").is_applied());

        let invoice = pipeline.snapshot();
        assert_eq!(invoice.item_count(), 2);
        assert_eq!(invoice.items[0].description, "paint");
        assert_eq!(invoice.total, Decimal::from(25));
    }

    #[tokio::test]
    async fn snapshots_follow_applied_mutations() {
        let mut pipeline = pipeline();
        let mut invoices = pipeline.watch_invoice();
        pipeline.start().await.expect("start");

        pipeline.submit(final_event("customer is acme")).await.expect("submit");
        invoices.changed().await.expect("snapshot published");
        assert_eq!(invoices.borrow_and_update().customer_name, "acme");

        pipeline.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn forwards_every_event_from_a_source() {
        let mut source = MockTranscriptSource::new();
        let mut events = vec![
            final_event("add 5 units of paint at 20 each"),
            SttEvent::Partial("set tax".to_string()),
            final_event("set tax to 10"),
        ]
        .into_iter();
        source.expect_is_ready().return_const(true);
        source.expect_name().return_const("Mock".to_string());
        source.expect_language().return_const(Language::Auto);
        source.expect_poll().returning(move || events.next());

        let mut pipeline = pipeline();
        pipeline.start().await.expect("start");
        let forwarded = pipeline.forward_from(&mut source).await.expect("forward");
        pipeline.stop().await.expect("stop");

        assert_eq!(forwarded, 3);
        assert_eq!(pipeline.snapshot().total, Decimal::from(110));
    }

    #[tokio::test]
    async fn source_must_be_ready_before_forwarding() {
        let mut source = MockTranscriptSource::new();
        source.expect_is_ready().return_const(false);
        source.expect_name().return_const("Mock".to_string());
        source.expect_poll().never();

        let mut pipeline = pipeline();
        pipeline.start().await.expect("start");
        let result = pipeline.forward_from(&mut source).await;
        pipeline.stop().await.expect("stop");

        assert!(matches!(result, Err(PipelineError::SourceNotReady(name)) if name == "Mock"));
    }

    #[tokio::test]
    async fn language_applies_on_start() {
        let mut pipeline = pipeline();
        let mut feedback = pipeline.subscribe();
        pipeline.set_language(Language::English);
        pipeline.start().await.expect("start");

        pipeline.submit(final_event("ajouter 3 chaises à 40")).await.expect("submit");
        pipeline.stop().await.expect("stop");

        assert!(matches!(
            feedback.recv().await.expect("feedback"),
            Feedback::Unrecognized { .. }
        ));
        assert_eq!(pipeline.config().language, Language::English);
    }
}
