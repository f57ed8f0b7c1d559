use uuid::Uuid;

use super::LuminaireType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStatus {
    Pending,
    Processing,
    Completed,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Pending => "pending",
            GroupStatus::Processing => "processing",
            GroupStatus::Completed => "completed",
        }
    }
}

/// Consolidated decision for one physical fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    pub group_id: String,
    pub total_photos: usize,
    /// Items in `completed` or `error`.
    pub processed_photos: usize,
    pub led_count: usize,
    pub hid_count: usize,
    pub unknown_count: usize,
    pub final_type: LuminaireType,
    /// Mean confidence of the items that voted for `final_type`.
    pub avg_confidence: f64,
    pub status: GroupStatus,
    pub item_ids: Vec<Uuid>,
}

/// Batch-wide counters shown alongside the group table.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub progress_percent: f64,
    pub groups: usize,
    pub led_groups: usize,
    pub hid_groups: usize,
}
