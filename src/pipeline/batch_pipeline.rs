use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{aggregator, snapshot::BatchSnapshot};
use crate::classifier::Classifier;
use crate::common::{BatchItem, GroupResult, ItemPatch};
use crate::intake::ImageDecoder;

/// Pause inserted between two items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    Fixed(Duration),
    Skip,
}

impl Pacing {
    pub fn from_delay(delay: Duration) -> Self {
        if delay.is_zero() {
            Pacing::Skip
        } else {
            Pacing::Fixed(delay)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineState {
    pub snapshot: BatchSnapshot,
    pub running: bool,
}

/// Read-only view of a running (or finished) batch.
#[derive(Clone)]
pub struct PipelineObserver {
    state_rx: watch::Receiver<PipelineState>,
}

impl PipelineObserver {
    pub fn snapshot(&self) -> BatchSnapshot {
        self.state_rx.borrow().snapshot.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state_rx.borrow().running
    }

    pub fn groups(&self) -> Vec<GroupResult> {
        aggregator::aggregate(self.snapshot().items())
    }

    /// Resolves once the pipeline stops running (or is dropped).
    pub async fn finished(&mut self) -> BatchSnapshot {
        loop {
            if !self.state_rx.borrow_and_update().running {
                break;
            }
            if self.state_rx.changed().await.is_err() {
                break;
            }
        }
        self.snapshot()
    }
}

/// Next scheduled step of the pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineStep {
    Start(usize),
    Process(usize),
    Pace(usize),
    Done,
}

/// Drives a fixed, ordered list of items through one classifier, one item at
/// a time. A failing item is marked `error` and the batch carries on.
pub struct BatchPipeline {
    decoder: Arc<dyn ImageDecoder>,
    classifier: Arc<dyn Classifier>,
    pacing: Pacing,
    snapshot: BatchSnapshot,
    state_tx: watch::Sender<PipelineState>,
}

impl BatchPipeline {
    pub fn new(
        items: Vec<BatchItem>,
        decoder: Arc<dyn ImageDecoder>,
        classifier: Arc<dyn Classifier>,
        pacing: Pacing,
    ) -> (Self, PipelineObserver) {
        let snapshot = BatchSnapshot::new(items);
        let (state_tx, state_rx) = watch::channel(PipelineState {
            snapshot: snapshot.clone(),
            running: true,
        });

        let pipeline = Self {
            decoder,
            classifier,
            pacing,
            snapshot,
            state_tx,
        };
        (pipeline, PipelineObserver { state_rx })
    }

    /// Runs to completion. `cancel_token` is only honoured between items.
    pub async fn run(mut self, cancel_token: CancellationToken) -> BatchSnapshot {
        info!(
            "Starting batch of {} images with {}",
            self.snapshot.len(),
            self.classifier.name()
        );

        let mut step = PipelineStep::Start(0);
        loop {
            step = match step {
                PipelineStep::Start(index) => self.start(index, &cancel_token),
                PipelineStep::Process(index) => self.process(index).await,
                PipelineStep::Pace(index) => self.pace(index, &cancel_token).await,
                PipelineStep::Done => break,
            };
        }

        self.publish(false);
        info!("Batch finished: {} images", self.snapshot.len());
        self.snapshot
    }

    fn start(&mut self, index: usize, cancel_token: &CancellationToken) -> PipelineStep {
        if cancel_token.is_cancelled() {
            info!("Batch cancelled before item {}", index);
            return PipelineStep::Done;
        }

        let Some(item_id) = self.snapshot.get(index).map(BatchItem::id) else {
            return PipelineStep::Done;
        };

        self.update(item_id, ItemPatch::Processing);
        PipelineStep::Process(index)
    }

    async fn process(&mut self, index: usize) -> PipelineStep {
        let Some(item) = self.snapshot.get(index).cloned() else {
            return PipelineStep::Done;
        };

        let patch = self.analyze_item(&item).await;
        self.update(item.id(), patch);
        PipelineStep::Pace(index)
    }

    async fn analyze_item(&self, item: &BatchItem) -> ItemPatch {
        debug!("Processing {} ({})", item.file_name(), item.group_id());

        let image = match self.decoder.decode(item.source()).await {
            Ok(image) => image,
            Err(e) => {
                warn!("Failed to decode {}: {}", item.file_name(), e);
                return ItemPatch::Failed(e.to_string());
            }
        };

        match self.classifier.analyze(&image).await {
            Ok(result) => {
                debug!(
                    "{} classified as {} ({:.2})",
                    item.file_name(),
                    result.luminaire_type(),
                    result.confidence()
                );
                ItemPatch::Completed(result.for_file(item.file_name(), Utc::now()))
            }
            Err(e) => {
                error!("Error processing {}: {}", item.file_name(), e);
                ItemPatch::Failed(e.to_string())
            }
        }
    }

    async fn pace(&self, index: usize, cancel_token: &CancellationToken) -> PipelineStep {
        let next = index + 1;
        if next >= self.snapshot.len() {
            return PipelineStep::Done;
        }

        if let Pacing::Fixed(delay) = self.pacing {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel_token.cancelled() => {}
            }
        }

        PipelineStep::Start(next)
    }

    fn update(&mut self, item_id: Uuid, patch: ItemPatch) {
        self.snapshot = self.snapshot.apply_update(item_id, patch);
        self.publish(true);
    }

    fn publish(&self, running: bool) {
        self.state_tx.send_replace(PipelineState {
            snapshot: self.snapshot.clone(),
            running,
        });
    }
}
