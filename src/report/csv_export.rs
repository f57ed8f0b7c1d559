//! Spreadsheet-friendly CSV: UTF-8 with a byte-order mark, quoted text
//! fields, bare numeric fields.
use crate::common::{BatchItem, GroupResult};
use crate::error::ExportError;

/// Makes spreadsheet readers pick UTF-8, so accented text survives.
pub const BOM: char = '\u{feff}';

const GROUP_HEADERS: [&str; 7] = [
    "ID Luminária (Pasta)",
    "Classificação Final",
    "Precisão Média (%)",
    "Qtd Fotos LED",
    "Qtd Fotos HID",
    "Qtd Fotos Incertas",
    "Total Fotos",
];

const ITEM_HEADERS: [&str; 5] = [
    "Arquivo",
    "Classificação",
    "Confiança (%)",
    "Status",
    "Detalhes",
];

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn percent(confidence: f64) -> i64 {
    (confidence * 100.0).round() as i64
}

fn document(headers: &[&str], rows: Vec<String>) -> String {
    let mut csv = String::new();
    csv.push(BOM);
    csv.push_str(&headers.join(","));
    for row in rows {
        csv.push('\n');
        csv.push_str(&row);
    }
    csv
}

/// One row per fixture. An empty group list has nothing to export.
pub fn export_groups_csv(groups: &[GroupResult]) -> Result<String, ExportError> {
    if groups.is_empty() {
        return Err(ExportError::EmptyReport);
    }

    let rows = groups
        .iter()
        .map(|group| {
            [
                quote(&group.group_id),
                quote(group.final_type.report_label()),
                percent(group.avg_confidence).to_string(),
                group.led_count.to_string(),
                group.hid_count.to_string(),
                group.unknown_count.to_string(),
                group.total_photos.to_string(),
            ]
            .join(",")
        })
        .collect();

    Ok(document(&GROUP_HEADERS, rows))
}

/// One row per photograph, with the explanation or the error message.
pub fn export_items_csv(items: &[BatchItem]) -> Result<String, ExportError> {
    if items.is_empty() {
        return Err(ExportError::EmptyReport);
    }

    let rows = items
        .iter()
        .map(|item| {
            let (label, confidence, details) = match (item.result(), item.error()) {
                (Some(result), _) => (
                    result.luminaire_type().report_label(),
                    percent(result.confidence()).to_string(),
                    result.explanation(),
                ),
                (None, Some(error)) => ("", String::new(), error),
                (None, None) => ("", String::new(), ""),
            };

            [
                quote(item.file_name()),
                quote(label),
                confidence,
                quote(item.status().as_str()),
                quote(details),
            ]
            .join(",")
        })
        .collect();

    Ok(document(&ITEM_HEADERS, rows))
}
