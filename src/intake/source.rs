use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::common::{BatchItem, ImageSource};
use crate::error::AppError;

/// Group for photos uploaded without any folder hierarchy.
pub const FLAT_UPLOAD_GROUP: &str = "Geral";
/// Group for photos whose folder segment is blank.
pub const NO_FOLDER_GROUP: &str = "Sem ID";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

/// `Root/1234/img1.jpg` belongs to unit `1234`; a bare `img1.jpg` to the
/// flat-upload group.
pub fn derive_group_id(relative_path: &str) -> String {
    let segments: Vec<&str> = relative_path.split('/').collect();
    if segments.len() < 2 {
        return FLAT_UPLOAD_GROUP.to_string();
    }

    let folder = segments[segments.len() - 2].trim();
    if folder.is_empty() {
        NO_FOLDER_GROUP.to_string()
    } else {
        folder.to_string()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Lists the photographs under `root`, sorted by relative path.
///
/// Relative paths start with the name of `root` itself, so a folder picked as
/// `Root` yields `Root/1234/img1.jpg`, also when it is given as `.` or `..`.
/// A single file yields a flat source. Entries below `root` that cannot be
/// read are skipped; only an unreadable `root` fails.
pub fn collect_sources(root: &Path) -> Result<Vec<ImageSource>, AppError> {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let root = root.as_path();

    if root.is_file() {
        let name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(if is_image(root) {
            vec![ImageSource::new(root, name)]
        } else {
            Vec::new()
        });
    }

    let base = root.parent().unwrap_or(root);
    let mut sources = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(AppError::Intake(root.to_path_buf(), e)),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_image(entry.path()) {
            continue;
        }

        let relative = entry.path().strip_prefix(base).unwrap_or(entry.path());
        let relative_path = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        debug!("Found image {}", relative_path);
        sources.push(ImageSource::new(entry.path(), relative_path));
    }

    sources.sort_by(|a, b| a.relative_path().cmp(b.relative_path()));
    info!("Collected {} images under {}", sources.len(), root.display());
    Ok(sources)
}

/// Creates one pending item per source, in order.
pub fn build_batch(sources: Vec<ImageSource>) -> Result<Vec<BatchItem>, AppError> {
    if sources.is_empty() {
        return Err(AppError::NoImagesFound);
    }

    Ok(sources
        .into_iter()
        .map(|source| BatchItem::new(derive_group_id(source.relative_path()), source))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ProcessingStatus;
    use std::fs;
    use uuid::Uuid;

    #[test]
    fn group_is_second_to_last_segment() {
        assert_eq!(derive_group_id("Root/1234/img1.jpg"), "1234");
        assert_eq!(derive_group_id("a/b/c/5678/x.png"), "5678");
        assert_eq!(derive_group_id("Root/img1.jpg"), "Root");
    }

    #[test]
    fn flat_file_uses_fallback_group() {
        assert_eq!(derive_group_id("img1.jpg"), FLAT_UPLOAD_GROUP);
        assert_ne!(FLAT_UPLOAD_GROUP, NO_FOLDER_GROUP);
    }

    #[test]
    fn blank_folder_uses_no_folder_group() {
        assert_eq!(derive_group_id("/img1.jpg"), NO_FOLDER_GROUP);
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(build_batch(Vec::new()), Err(AppError::NoImagesFound)));
    }

    #[test]
    fn batch_items_start_pending() {
        let items = build_batch(vec![
            ImageSource::new("/r/1/a.jpg", "r/1/a.jpg"),
            ImageSource::new("/r/2/b.jpg", "r/2/b.jpg"),
        ])
        .unwrap();

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.status() == ProcessingStatus::Pending));
        assert_eq!(items[0].group_id(), "1");
        assert_eq!(items[1].group_id(), "2");
    }

    #[test]
    fn collects_only_images_in_path_order() {
        let root = std::env::temp_dir().join(format!("lumicheck-intake-{}", Uuid::new_v4()));
        fs::create_dir_all(root.join("900")).unwrap();
        fs::create_dir_all(root.join("100")).unwrap();
        fs::write(root.join("900/b.JPG"), b"x").unwrap();
        fs::write(root.join("100/a.png"), b"x").unwrap();
        fs::write(root.join("100/notes.txt"), b"x").unwrap();

        let sources = collect_sources(&root).unwrap();
        let root_name = root.file_name().unwrap().to_string_lossy().into_owned();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].relative_path(), format!("{}/100/a.png", root_name));
        assert_eq!(sources[1].relative_path(), format!("{}/900/b.JPG", root_name));
        assert_eq!(derive_group_id(sources[1].relative_path()), "900");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn dotted_root_is_named_after_the_real_folder() {
        let root = std::env::temp_dir().join(format!("lumicheck-intake-{}", Uuid::new_v4()));
        fs::create_dir_all(root.join("1234/sub")).unwrap();
        fs::write(root.join("1234/a.png"), b"x").unwrap();

        let sources = collect_sources(&root.join("1234/sub/..")).unwrap();

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].relative_path(), "1234/a.png");
        assert_eq!(derive_group_id(sources[0].relative_path()), "1234");

        fs::remove_dir_all(&root).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_is_skipped() {
        let root = std::env::temp_dir().join(format!("lumicheck-intake-{}", Uuid::new_v4()));
        fs::create_dir_all(root.join("1234")).unwrap();
        fs::write(root.join("1234/a.png"), b"x").unwrap();
        std::os::unix::fs::symlink(root.join("missing.jpg"), root.join("1234/b.jpg")).unwrap();

        let sources = collect_sources(&root).unwrap();

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].file_name(), "a.png");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_root_fails() {
        let root = std::env::temp_dir().join(format!("lumicheck-missing-{}", Uuid::new_v4()));
        assert!(matches!(
            collect_sources(&root),
            Err(AppError::Intake(_, _))
        ));
    }
}
