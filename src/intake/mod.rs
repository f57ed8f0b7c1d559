pub mod decoder;
pub mod source;

pub use decoder::{FileImageDecoder, ImageDecoder};
pub use source::{
    build_batch, collect_sources, derive_group_id, FLAT_UPLOAD_GROUP, NO_FOLDER_GROUP,
};
