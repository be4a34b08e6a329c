use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A language project root found in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub language: String,
    pub path: PathBuf,
}

/// Marker file → language tag. Order decides the order of detections that
/// share a directory.
const MARKERS: &[(&str, &str)] = &[
    ("go.mod", "go"),
    ("Cargo.toml", "rust"),
    ("package.json", "javascript"),
    ("pyproject.toml", "python"),
];

/// Directories never treated as project roots.
const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "target",
    "dist",
    "build",
    "testdata",
    ".cache",
];

impl Detection {
    pub fn new(language: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            language: language.into(),
            path: path.into(),
        }
    }
}

/// Find language roots in `root` and its immediate subdirectories.
///
/// A subdirectory is not reported for a language that the root itself
/// already covers (a Cargo workspace member, a nested Go package).
pub fn detect(root: &Path) -> io::Result<Vec<Detection>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("directory {} does not exist", root.display()),
        ));
    }

    let mut detections = markers_in(root);
    let root_languages: Vec<String> = detections.iter().map(|d| d.language.clone()).collect();

    let mut subdirs: Vec<PathBuf> = fs::read_dir(root)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !name.starts_with('.') && !SKIP_DIRS.contains(&name))
        })
        .collect();
    subdirs.sort();

    for dir in subdirs {
        detections.extend(
            markers_in(&dir)
                .into_iter()
                .filter(|d| !root_languages.contains(&d.language)),
        );
    }

    tracing::debug!(root = %root.display(), count = detections.len(), "detected languages");
    Ok(detections)
}

fn markers_in(dir: &Path) -> Vec<Detection> {
    MARKERS
        .iter()
        .filter(|(marker, _)| dir.join(marker).is_file())
        .map(|(_, language)| Detection::new(*language, dir))
        .collect()
}
