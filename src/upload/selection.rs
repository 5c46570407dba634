use ignore::Walk;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::upload::types::FileDescriptor;
use crate::upload::validation::ValidationRules;

/// Turns picked paths into descriptors, keeping pick order. Paths that
/// cannot be read are logged and left out.
pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Vec<FileDescriptor> {
    paths
        .into_iter()
        .filter_map(|path| match FileDescriptor::from_path(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable selection");
                None
            }
        })
        .collect()
}

/// Collects the accepted files under `folder`, honouring `.gitignore` and
/// hidden-file rules. Files of other types are skipped rather than failing
/// the whole batch later.
pub fn from_folder(folder: &Path, rules: &ValidationRules) -> Vec<FileDescriptor> {
    let mut files = Vec::new();
    for entry in Walk::new(folder) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(folder = %folder.display(), error = %e, "error while walking folder");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match FileDescriptor::from_path(path) {
            Ok(file) if rules.accepts_extension(&file.extension) => files.push(file),
            Ok(file) => debug!(file = %file.name, "unsupported type skipped"),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn paths_keep_order_and_skip_missing() {
        let dir = tempfile::tempdir().unwrap();
        let b = dir.path().join("b.md");
        let a = dir.path().join("a.pdf");
        fs::write(&b, b"# notes").unwrap();
        fs::write(&a, b"%PDF").unwrap();

        let files = from_paths(vec![b, dir.path().join("missing.txt"), a]);
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b.md", "a.pdf"]);
    }

    #[test]
    fn folder_walk_keeps_accepted_types() {
        let dir = tempfile::Builder::new()
            .prefix("material")
            .tempdir()
            .unwrap();
        fs::write(dir.path().join("lecture.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("script.sh"), b"echo").unwrap();
        fs::create_dir(dir.path().join("week2")).unwrap();
        fs::write(dir.path().join("week2").join("summary.MD"), b"# w2").unwrap();

        let files = from_folder(dir.path(), &ValidationRules::default());
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["lecture.pdf", "summary.MD"]);
    }
}
