use std::fmt;

use tracing::warn;
use uuid::Uuid;

use super::{AnalysisResult, ImageSource};

/// Lifecycle of one photograph: `Pending -> Processing -> {Completed, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Error)
    }

    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        matches!(
            (self, next),
            (ProcessingStatus::Pending, ProcessingStatus::Processing)
                | (ProcessingStatus::Processing, ProcessingStatus::Completed)
                | (ProcessingStatus::Processing, ProcessingStatus::Error)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Error => "error",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single state transition for one item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPatch {
    Processing,
    Completed(AnalysisResult),
    Failed(String),
}

impl ItemPatch {
    fn target_status(&self) -> ProcessingStatus {
        match self {
            ItemPatch::Processing => ProcessingStatus::Processing,
            ItemPatch::Completed(_) => ProcessingStatus::Completed,
            ItemPatch::Failed(_) => ProcessingStatus::Error,
        }
    }
}

/// One photograph under analysis. `result` is present only when completed,
/// `error` only when failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    id: Uuid,
    group_id: String,
    source: ImageSource,
    status: ProcessingStatus,
    result: Option<AnalysisResult>,
    error: Option<String>,
}

impl BatchItem {
    pub fn new(group_id: impl Into<String>, source: ImageSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id: group_id.into(),
            source,
            status: ProcessingStatus::Pending,
            result: None,
            error: None,
        }
    }

    /// Returns the item after `patch`. Transitions that would move the item
    /// backwards or out of a terminal status leave it unchanged.
    pub fn apply(&self, patch: ItemPatch) -> BatchItem {
        let target = patch.target_status();
        if !self.status.can_transition_to(target) {
            warn!(
                "Ignoring transition of item {} from {} to {}",
                self.id, self.status, target
            );
            return self.clone();
        }

        let mut next = self.clone();
        next.status = target;
        match patch {
            ItemPatch::Processing => {}
            ItemPatch::Completed(result) => next.result = Some(result),
            ItemPatch::Failed(message) => next.error = Some(message),
        }
        next
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn file_name(&self) -> &str {
        self.source.file_name()
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::LuminaireType;

    fn item() -> BatchItem {
        BatchItem::new("1234", ImageSource::new("/x/1234/a.jpg", "x/1234/a.jpg"))
    }

    #[test]
    fn new_items_are_pending() {
        let item = item();
        assert_eq!(item.status(), ProcessingStatus::Pending);
        assert!(item.result().is_none());
        assert!(item.error().is_none());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(item().id(), item().id());
    }

    #[test]
    fn completes_through_processing() {
        let result = AnalysisResult::new(LuminaireType::Led, 0.9, "led");
        let done = item()
            .apply(ItemPatch::Processing)
            .apply(ItemPatch::Completed(result.clone()));

        assert_eq!(done.status(), ProcessingStatus::Completed);
        assert_eq!(done.result(), Some(&result));
        assert!(done.error().is_none());
    }

    #[test]
    fn cannot_skip_processing() {
        let original = item();
        let patched = original.apply(ItemPatch::Failed("boom".to_string()));
        assert_eq!(patched, original);
    }

    #[test]
    fn terminal_status_never_reverses() {
        let failed = item()
            .apply(ItemPatch::Processing)
            .apply(ItemPatch::Failed("decode".to_string()));

        let retried = failed
            .apply(ItemPatch::Processing)
            .apply(ItemPatch::Completed(AnalysisResult::new(
                LuminaireType::Hid,
                0.8,
                "hid",
            )));

        assert_eq!(retried.status(), ProcessingStatus::Error);
        assert_eq!(retried.error(), Some("decode"));
        assert!(retried.result().is_none());
    }
}
