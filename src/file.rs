// src/file.rs

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::DatasetError;

/// Create `dir` (and parents) unless it already exists.
pub fn ensure_directory(dir: &Path) -> Result<(), DatasetError> {
    if dir.exists() && !dir.is_dir() {
        return Err(DatasetError::NotADirectory(dir.to_path_buf()));
    }
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| DatasetError::Io { path: dir.to_path_buf(), source })?;
    }
    Ok(())
}

/// Ensure the parent directory of a file path exists.
pub fn ensure_parent(path: &Path) -> Result<(), DatasetError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory(parent),
        _ => Ok(()),
    }
}

/// `out/2024/senate_votes_2024.csv` → (`..._2024_metadata.csv`, `..._2024_votes.csv`)
pub fn split_paths(path: &Path) -> (PathBuf, PathBuf) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| s!("csv"));
    (
        path.with_file_name(format!("{stem}_metadata.{ext}")),
        path.with_file_name(format!("{stem}_votes.{ext}")),
    )
}

/// Every `*.csv` exactly one directory below `dir` (`dir/*/*.csv`), sorted.
pub fn csv_files_one_level(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    if !dir.is_dir() {
        return Err(DatasetError::NotADirectory(dir.to_path_buf()));
    }
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source| DatasetError::Io { path, source }
    };

    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(io(dir))? {
        let sub = entry.map_err(io(dir))?.path();
        if !sub.is_dir() {
            continue;
        }
        for file in fs::read_dir(&sub).map_err(io(&sub))? {
            let p = file.map_err(io(&sub))?.path();
            let is_csv = p
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if p.is_file() && is_csv {
                out.push(p);
            }
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_paths_keep_directory() {
        let (m, v) = split_paths(Path::new("out/2024/senate_votes_2024.csv"));
        assert_eq!(m, Path::new("out/2024/senate_votes_2024_metadata.csv"));
        assert_eq!(v, Path::new("out/2024/senate_votes_2024_votes.csv"));
    }

    #[test]
    fn ensure_directory_rejects_files() {
        let tmp = tempfile::tempdir().unwrap();
        let f = tmp.path().join("plain");
        fs::write(&f, "x").unwrap();
        assert!(matches!(ensure_directory(&f), Err(DatasetError::NotADirectory(_))));
        ensure_directory(&tmp.path().join("a/b")).unwrap();
        assert!(tmp.path().join("a/b").is_dir());
    }

    #[test]
    fn finds_csv_one_level_deep_only() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("2023")).unwrap();
        fs::create_dir_all(root.join("2024/deeper")).unwrap();
        fs::write(root.join("top.csv"), "").unwrap();
        fs::write(root.join("2023/a.csv"), "").unwrap();
        fs::write(root.join("2024/b.CSV"), "").unwrap();
        fs::write(root.join("2024/notes.txt"), "").unwrap();
        fs::write(root.join("2024/deeper/c.csv"), "").unwrap();

        let found = csv_files_one_level(root).unwrap();
        assert_eq!(found, vec![root.join("2023/a.csv"), root.join("2024/b.CSV")]);
    }
}
