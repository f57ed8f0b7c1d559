//! Per-unit majority vote over the current item snapshot.
use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::common::{BatchItem, BatchSummary, GroupResult, GroupStatus, LuminaireType};

/// Reduces items to one result per group. Numeric group ids (`9`, `10`)
/// come first in ascending order, the rest follow in order of first
/// appearance. Pure: the same items always produce the same groups.
pub fn aggregate(items: &[BatchItem]) -> Vec<GroupResult> {
    let mut groups: IndexMap<&str, Vec<&BatchItem>> = IndexMap::new();
    for item in items {
        groups.entry(item.group_id()).or_default().push(item);
    }
    groups.sort_by(|a, _, b, _| match (numeric_id(a), numeric_id(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    groups
        .into_iter()
        .map(|(group_id, members)| group_result(group_id, &members))
        .collect()
}

/// Canonical non-negative integer ids only: `0123` and `+5` are names.
fn numeric_id(group_id: &str) -> Option<u32> {
    group_id
        .parse::<u32>()
        .ok()
        .filter(|value| *value != u32::MAX && value.to_string() == group_id)
}

fn group_result(group_id: &str, members: &[&BatchItem]) -> GroupResult {
    let total_photos = members.len();
    let processed_photos = members
        .iter()
        .filter(|item| item.status().is_terminal())
        .count();

    let count_of = |wanted: LuminaireType| {
        members
            .iter()
            .filter_map(|item| item.result())
            .filter(|result| result.luminaire_type() == wanted)
            .count()
    };
    let led_count = count_of(LuminaireType::Led);
    let hid_count = count_of(LuminaireType::Hid);
    let unknown_count = count_of(LuminaireType::Unknown);

    let final_type = majority_vote(led_count, hid_count, unknown_count);

    let winning: Vec<f64> = members
        .iter()
        .filter_map(|item| item.result())
        .filter(|result| result.luminaire_type() == final_type)
        .map(|result| result.confidence())
        .collect();
    let avg_confidence = if winning.is_empty() {
        0.0
    } else {
        winning.iter().sum::<f64>() / winning.len() as f64
    };

    let status = if processed_photos == total_photos {
        GroupStatus::Completed
    } else if processed_photos > 0 {
        GroupStatus::Processing
    } else {
        GroupStatus::Pending
    };

    GroupResult {
        group_id: group_id.to_string(),
        total_photos,
        processed_photos,
        led_count,
        hid_count,
        unknown_count,
        final_type,
        avg_confidence,
        status,
        item_ids: members.iter().map(|item| item.id()).collect(),
    }
}

/// LED must beat HID and at least match UNKNOWN; likewise for HID.
/// A tie between LED and HID is UNKNOWN.
pub fn majority_vote(led_count: usize, hid_count: usize, unknown_count: usize) -> LuminaireType {
    if led_count > hid_count && led_count >= unknown_count {
        LuminaireType::Led
    } else if hid_count > led_count && hid_count >= unknown_count {
        LuminaireType::Hid
    } else {
        LuminaireType::Unknown
    }
}

pub fn summarize(items: &[BatchItem], groups: &[GroupResult]) -> BatchSummary {
    let total = items.len();
    let processed = items
        .iter()
        .filter(|item| item.status().is_terminal())
        .count();
    let progress_percent = if total == 0 {
        0.0
    } else {
        processed as f64 * 100.0 / total as f64
    };

    BatchSummary {
        total,
        processed,
        progress_percent,
        groups: groups.len(),
        led_groups: groups
            .iter()
            .filter(|group| group.final_type == LuminaireType::Led)
            .count(),
        hid_groups: groups
            .iter()
            .filter(|group| group.final_type == LuminaireType::Hid)
            .count(),
    }
}
