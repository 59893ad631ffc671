//! Input discovery for the CLI.
//!
//! Arguments may name files or directories. Files are taken as given, in
//! argument order, so the user can point at anything the decoder might read.
//! Directories are walked recursively and contribute only files with a
//! supported image extension, sorted by path for stable output.

use crate::imaging::has_supported_extension;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Expand file and directory arguments into a list of image paths.
pub fn collect_images<P: AsRef<Path>>(args: &[P]) -> Vec<PathBuf> {
    let mut images = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        if arg.is_dir() {
            let before = images.len();
            images.extend(walk_dir(arg));
            debug!(dir = %arg.display(), found = images.len() - before, "walked input directory");
        } else {
            images.push(arg.to_path_buf());
        }
    }
    images
}

fn walk_dir(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| warn!("skipping unreadable entry: {e}"))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_supported_extension(path))
        .collect();
    found.sort();
    found
}

/// Output file for `input` inside `output_dir`: same stem, `.png` extension.
///
/// Several inputs with the same stem (e.g. `a.jpg` and `a.png`) would
/// collide, so the original extension is kept in the stem when `keep_ext`
/// is set.
pub fn output_path(output_dir: &Path, input: &Path, keep_ext: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let name = match input.extension() {
        Some(ext) if keep_ext => format!("{}.{}.png", stem, ext.to_string_lossy()),
        _ => format!("{stem}.png"),
    };
    output_dir.join(name)
}

/// True when two inputs would map to the same output name.
pub fn has_stem_collisions(inputs: &[PathBuf]) -> bool {
    let mut stems: Vec<_> = inputs.iter().filter_map(|p| p.file_stem()).collect();
    let total = stems.len();
    stems.sort();
    stems.dedup();
    stems.len() != total
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn directory_walk_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("b.png"));
        touch(&tmp.path().join("a.JPG"));
        touch(&tmp.path().join("notes.txt"));
        touch(&tmp.path().join("nested/c.tiff"));

        let found = collect_images(&[tmp.path()]);
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.JPG"),
                PathBuf::from("b.png"),
                PathBuf::from("nested/c.tiff"),
            ]
        );
    }

    #[test]
    fn explicit_files_are_kept_in_order() {
        let args = [PathBuf::from("z.png"), PathBuf::from("missing.txt")];
        assert_eq!(collect_images(&args), args.to_vec());
    }

    #[test]
    fn output_path_uses_png() {
        let out = output_path(Path::new("/out"), Path::new("/in/photo.jpg"), false);
        assert_eq!(out, PathBuf::from("/out/photo.png"));
        let kept = output_path(Path::new("/out"), Path::new("/in/photo.jpg"), true);
        assert_eq!(kept, PathBuf::from("/out/photo.jpg.png"));
    }

    #[test]
    fn stem_collisions_detected() {
        let unique = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        assert!(!has_stem_collisions(&unique));
        let clash = vec![PathBuf::from("x/a.png"), PathBuf::from("y/a.jpg")];
        assert!(has_stem_collisions(&clash));
    }
}
