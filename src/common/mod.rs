mod batch_item;
mod group;
mod image_source;
mod luminaire;

pub use batch_item::{BatchItem, ItemPatch, ProcessingStatus};
pub use group::{BatchSummary, GroupResult, GroupStatus};
pub use image_source::ImageSource;
pub use luminaire::{AnalysisResult, LuminaireType};
