use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    classifier::{self, Classifier, TextRecognizer, VisionTransport},
    common::{BatchSummary, GroupResult, ImageSource},
    config::{ClassifierStrategy, Configuration},
    error::AppError,
    intake::{self, FileImageDecoder, ImageDecoder},
    pipeline::{self, BatchPipeline, BatchSnapshot, Pacing, PipelineObserver},
};

struct ActiveBatch {
    observer: PipelineObserver,
    pipeline_task: Option<JoinHandle<BatchSnapshot>>,
    cancel_token: CancellationToken,
}

/// Owns the current batch: submits it, exposes its progress and discards it
/// on reset. The classifier is fixed for the coordinator's lifetime.
///
/// At most one classification call is in flight across batches: a batch
/// submitted after a reset only starts once the discarded batch has let go
/// of its last item.
pub struct Coordinator {
    configuration: Configuration,
    decoder: Arc<dyn ImageDecoder>,
    classifier: Arc<dyn Classifier>,
    batch: Option<ActiveBatch>,
    // Task of the last discarded batch, still finishing its in-flight item.
    draining: Option<JoinHandle<BatchSnapshot>>,
}

impl Coordinator {
    fn new(
        configuration: Configuration,
        decoder: Arc<dyn ImageDecoder>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            configuration,
            decoder,
            classifier,
            batch: None,
            draining: None,
        }
    }

    /// Replaces any previous batch with `sources` and starts processing them
    /// in the background. Must be called from within a tokio runtime.
    pub fn submit(&mut self, sources: Vec<ImageSource>) -> Result<PipelineObserver, AppError> {
        let items = intake::build_batch(sources)?;
        self.reset();

        info!(
            "Submitting batch of {} images ({})",
            items.len(),
            self.classifier.name()
        );

        let (batch_pipeline, observer) = BatchPipeline::new(
            items,
            self.decoder.clone(),
            self.classifier.clone(),
            Pacing::from_delay(self.configuration.inter_item_delay()),
        );
        let cancel_token = CancellationToken::new();
        let previous = self.draining.take();
        let pipeline_token = cancel_token.clone();
        let pipeline_task = tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    warn!("Discarded batch ended abnormally: {}", e);
                }
            }
            batch_pipeline.run(pipeline_token).await
        });

        self.batch = Some(ActiveBatch {
            observer: observer.clone(),
            pipeline_task: Some(pipeline_task),
            cancel_token,
        });
        Ok(observer)
    }

    /// Waits for the current batch to finish and returns its final snapshot.
    pub async fn wait(&mut self) -> Result<BatchSnapshot, AppError> {
        let Some(batch) = self.batch.as_mut() else {
            return Ok(BatchSnapshot::default());
        };

        match batch.pipeline_task.take() {
            Some(task) => task
                .await
                .map_err(|e| AppError::Pipeline(format!("Pipeline task failed: {}", e))),
            None => Ok(batch.observer.snapshot()),
        }
    }

    /// Discards the current batch. An item already being analyzed finishes in
    /// the background, but no further items are started.
    pub fn reset(&mut self) {
        if let Some(batch) = self.batch.take() {
            batch.cancel_token.cancel();
            // A running task already waits on any older draining task.
            if let Some(task) = batch.pipeline_task {
                self.draining = Some(task);
            }
            info!("Batch discarded");
        }
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        self.batch
            .as_ref()
            .map(|batch| batch.observer.snapshot())
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.batch
            .as_ref()
            .map(|batch| batch.observer.is_running())
            .unwrap_or(false)
    }

    pub fn groups(&self) -> Vec<GroupResult> {
        pipeline::aggregate(self.snapshot().items())
    }

    pub fn summary(&self) -> BatchSummary {
        let snapshot = self.snapshot();
        let groups = pipeline::aggregate(snapshot.items());
        pipeline::summarize(snapshot.items(), &groups)
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.reset();
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    decoder: Option<Arc<dyn ImageDecoder>>,
    classifier: Option<Arc<dyn Classifier>>,
    recognizer: Option<Box<dyn TextRecognizer>>,
    transport: Option<Box<dyn VisionTransport>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            decoder: None,
            classifier: None,
            recognizer: None,
            transport: None,
        }
    }

    // Selects the classification backend, this will override the default configuration.
    pub fn strategy(mut self, strategy: ClassifierStrategy) -> Self {
        self.configuration.strategy = strategy;
        self
    }

    // Adjusts the pause between items, this will override the default configuration.
    pub fn inter_item_delay(mut self, delay: Duration) -> Self {
        self.configuration.inter_item_delay_ms = delay.as_millis() as u64;
        self
    }

    // Sets the remote service key, this will override the default configuration.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.configuration.api_key = Some(api_key.into());
        self
    }

    pub fn decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Bypasses strategy selection entirely.
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn text_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn transport(mut self, transport: Box<dyn VisionTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Fails before any image is touched when the configuration cannot work,
    /// e.g. the remote strategy without credentials.
    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration.validate()?;

        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => Arc::from(classifier::build_classifier(
                &self.configuration,
                self.recognizer,
                self.transport,
            )?),
        };
        let decoder = self.decoder.unwrap_or_else(|| {
            Arc::new(FileImageDecoder::new(self.configuration.max_image_width))
        });

        Ok(Coordinator::new(self.configuration, decoder, classifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{AnalysisResult, LuminaireType, ProcessingStatus};
    use crate::error::{ClassifierError, ConfigError, DecodeError};
    use async_trait::async_trait;
    use image::{ImageBuffer, Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BlankDecoder;

    #[async_trait]
    impl ImageDecoder for BlankDecoder {
        async fn decode(&self, _source: &ImageSource) -> Result<RgbImage, DecodeError> {
            Ok(ImageBuffer::from_pixel(4, 4, Rgb([250, 250, 250])))
        }
    }

    struct SlowClassifier;

    #[async_trait]
    impl Classifier for SlowClassifier {
        async fn analyze(&self, _image: &RgbImage) -> Result<AnalysisResult, ClassifierError> {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(AnalysisResult::new(LuminaireType::Led, 0.9, "led"))
        }

        fn name(&self) -> &'static str {
            "SlowClassifier"
        }
    }

    fn sources(count: usize) -> Vec<ImageSource> {
        (0..count)
            .map(|i| {
                let relative = format!("Root/{}/img{}.jpg", i % 2, i);
                ImageSource::new(format!("/data/{}", relative), relative)
            })
            .collect()
    }

    #[test]
    fn remote_without_key_fails_at_build() {
        let result = CoordinatorBuilder::new(Configuration::default())
            .strategy(ClassifierStrategy::Remote)
            .build();
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::MissingCredentials))
        ));
    }

    #[test]
    fn idle_coordinator_has_empty_state() {
        let coordinator = CoordinatorBuilder::new(Configuration::default())
            .build()
            .expect("Failed to build coordinator");
        assert!(coordinator.snapshot().is_empty());
        assert!(!coordinator.is_running());
        assert!(coordinator.groups().is_empty());
        assert_eq!(coordinator.summary().total, 0);
    }

    #[tokio::test]
    async fn empty_submission_is_rejected() {
        let mut coordinator = CoordinatorBuilder::new(Configuration::default())
            .build()
            .unwrap();
        assert!(matches!(
            coordinator.submit(Vec::new()),
            Err(AppError::NoImagesFound)
        ));
    }

    #[tokio::test]
    async fn runs_a_batch_with_the_local_strategy() {
        let mut coordinator = CoordinatorBuilder::new(Configuration::default())
            .inter_item_delay(Duration::ZERO)
            .decoder(Arc::new(BlankDecoder))
            .build()
            .unwrap();

        coordinator.submit(sources(4)).unwrap();
        let snapshot = coordinator.wait().await.unwrap();

        assert_eq!(snapshot.len(), 4);
        assert!(!coordinator.is_running());

        let groups = coordinator.groups();
        assert_eq!(groups.len(), 2);
        assert!(groups
            .iter()
            .all(|group| group.final_type == LuminaireType::Hid));

        let summary = coordinator.summary();
        assert_eq!(summary.processed, 4);
        assert_eq!(summary.hid_groups, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_discards_the_batch_between_items() {
        let mut coordinator = CoordinatorBuilder::new(Configuration::default())
            .decoder(Arc::new(BlankDecoder))
            .classifier(Arc::new(SlowClassifier))
            .build()
            .unwrap();

        let mut observer = coordinator.submit(sources(3)).unwrap();
        assert!(coordinator.is_running());

        coordinator.reset();
        assert!(coordinator.snapshot().is_empty());

        let last = observer.finished().await;
        let started = last
            .items()
            .iter()
            .filter(|item| item.status() != ProcessingStatus::Pending)
            .count();
        assert!(started <= 1, "{} items started after reset", started);
    }

    /// Tracks how many analyses overlap.
    #[derive(Default)]
    struct CountingClassifier {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Classifier for CountingClassifier {
        async fn analyze(&self, _image: &RgbImage) -> Result<AnalysisResult, ClassifierError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(AnalysisResult::new(LuminaireType::Hid, 0.8, "hid"))
        }

        fn name(&self) -> &'static str {
            "CountingClassifier"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resubmitting_never_overlaps_classifier_calls() {
        let classifier = Arc::new(CountingClassifier::default());
        let mut coordinator = CoordinatorBuilder::new(Configuration::default())
            .inter_item_delay(Duration::ZERO)
            .decoder(Arc::new(BlankDecoder))
            .classifier(classifier.clone())
            .build()
            .unwrap();

        coordinator.submit(sources(3)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        coordinator.submit(sources(2)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        coordinator.reset();
        coordinator.submit(sources(2)).unwrap();

        let snapshot = coordinator.wait().await.unwrap();

        assert_eq!(classifier.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(snapshot
            .items()
            .iter()
            .all(|item| item.status() == ProcessingStatus::Completed));
        // One item from the first batch, then the last batch in full.
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
    }
}
