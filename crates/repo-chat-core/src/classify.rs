//! File classification: decides which repository files are indexable text.
//!
//! Skipped: version-control internals, build and dependency output,
//! binary or generated extensions, lockfiles, operator-configured exclude
//! globs, and files above the size ceiling. Everything else is indexable.
//!
//! Classification is pure: it looks only at the relative path and, when
//! the caller has one, the file size.

use globset::{Glob, GlobSet, GlobSetBuilder};

/// Default size ceiling: 1 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn", ".bzr"];

const BUILD_DIRS: &[&str] = &[
    "target",
    "node_modules",
    "__pycache__",
    ".venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
];

const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tif", "tiff", "psd", "icns",
    // audio / video
    "mp3", "mp4", "wav", "ogg", "flac", "avi", "mov", "mkv", "webm",
    // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "jar", "war",
    // compiled objects and libraries
    "o", "obj", "a", "lib", "so", "dylib", "dll", "exe", "bin", "class", "pyc", "pyo", "wasm",
    "rlib",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // documents and databases
    "pdf", "db", "sqlite", "sqlite3",
    // generated
    "lock", "map",
];

const LOCKFILES: &[&str] = &[
    "Cargo.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Gemfile.lock",
    "composer.lock",
    "go.sum",
];

const GENERATED_GLOBS: &[&str] = &["**/*.min.js", "**/*.min.css"];

/// Why a file was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    VcsMetadata,
    ExcludedPath,
    BinaryExtension,
    Lockfile,
    TooLarge,
}

/// Outcome of [`FileClassifier::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Indexable,
    Skip(SkipReason),
}

impl Classification {
    pub fn is_indexable(&self) -> bool {
        matches!(self, Classification::Indexable)
    }
}

/// Path-based file classifier.
#[derive(Debug, Clone)]
pub struct FileClassifier {
    generated: GlobSet,
    excludes: GlobSet,
    max_file_bytes: u64,
}

impl FileClassifier {
    /// Build a classifier with extra exclude globs (matched against the
    /// `/`-separated relative path) and a size ceiling.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob pattern is invalid.
    pub fn new(exclude_globs: &[String], max_file_bytes: u64) -> Result<Self, globset::Error> {
        let generated: Vec<String> = GENERATED_GLOBS.iter().map(|g| g.to_string()).collect();
        Ok(Self {
            generated: build_globset(&generated)?,
            excludes: build_globset(exclude_globs)?,
            max_file_bytes,
        })
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Classify a file by its `/`-separated path relative to the
    /// repository root.
    pub fn classify(&self, relative_path: &str, size: Option<u64>) -> Classification {
        let path = relative_path;
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let Some((file_name, dirs)) = components.split_last() else {
            return Classification::Skip(SkipReason::ExcludedPath);
        };

        // A `.git` file marks a submodule or linked worktree.
        if VCS_DIRS.contains(file_name) || dirs.iter().any(|d| VCS_DIRS.contains(d)) {
            return Classification::Skip(SkipReason::VcsMetadata);
        }
        if dirs.iter().any(|d| BUILD_DIRS.contains(d)) || self.excludes.is_match(path) {
            return Classification::Skip(SkipReason::ExcludedPath);
        }
        if LOCKFILES.contains(file_name) {
            return Classification::Skip(SkipReason::Lockfile);
        }

        let ext = crate::models::extension_of(file_name);
        if BINARY_EXTENSIONS.contains(&ext.as_str()) || self.generated.is_match(path) {
            return Classification::Skip(SkipReason::BinaryExtension);
        }

        if let Some(bytes) = size {
            if bytes > self.max_file_bytes {
                return Classification::Skip(SkipReason::TooLarge);
            }
        }

        Classification::Indexable
    }

    /// Whether a directory walk should enter `relative_dir`.
    ///
    /// Pruning here is an optimisation only: [`classify`](Self::classify)
    /// skips every file underneath an excluded directory anyway.
    pub fn should_descend(&self, relative_dir: &str) -> bool {
        let name = relative_dir.rsplit('/').next().unwrap_or("");
        if VCS_DIRS.contains(&name) || BUILD_DIRS.contains(&name) {
            return false;
        }
        !self.excludes.is_match(relative_dir)
    }
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self {
            generated: build_globset(
                &GENERATED_GLOBS.iter().map(|g| g.to_string()).collect::<Vec<_>>(),
            )
            .unwrap_or_else(|_| GlobSet::empty()),
            excludes: GlobSet::empty(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(path: &str) -> Classification {
        FileClassifier::default().classify(path, None)
    }

    #[test]
    fn test_source_and_docs_indexable() {
        assert_eq!(classify("src/main.rs"), Classification::Indexable);
        assert_eq!(classify("README.md"), Classification::Indexable);
        assert_eq!(classify("Makefile"), Classification::Indexable);
        assert_eq!(classify("config/app.toml"), Classification::Indexable);
        assert_eq!(classify(".gitignore"), Classification::Indexable);
    }

    #[test]
    fn test_vcs_internals_skipped() {
        assert_eq!(
            classify(".git/HEAD"),
            Classification::Skip(SkipReason::VcsMetadata)
        );
        assert_eq!(
            classify("vendor/lib/.hg/store/data"),
            Classification::Skip(SkipReason::VcsMetadata)
        );
    }

    #[test]
    fn test_submodule_git_file_skipped() {
        assert_eq!(
            classify("vendor/dep/.git"),
            Classification::Skip(SkipReason::VcsMetadata)
        );
        assert_eq!(classify(".git"), Classification::Skip(SkipReason::VcsMetadata));
        assert_eq!(classify("docs/.github.md"), Classification::Indexable);
    }

    #[test]
    fn test_build_output_skipped() {
        assert_eq!(
            classify("target/debug/build.log"),
            Classification::Skip(SkipReason::ExcludedPath)
        );
        assert_eq!(
            classify("web/node_modules/left-pad/index.js"),
            Classification::Skip(SkipReason::ExcludedPath)
        );
    }

    #[test]
    fn test_binary_extensions_skipped() {
        for path in ["logo.PNG", "dist/app.wasm", "lib/foo.so", "a/b.tar.gz", "x.pyc"] {
            assert_eq!(
                classify(path),
                Classification::Skip(SkipReason::BinaryExtension),
                "{path}"
            );
        }
        assert_eq!(
            classify("static/app.min.js"),
            Classification::Skip(SkipReason::BinaryExtension)
        );
    }

    #[test]
    fn test_lockfiles_skipped() {
        assert_eq!(
            classify("Cargo.lock"),
            Classification::Skip(SkipReason::Lockfile)
        );
        assert_eq!(
            classify("frontend/package-lock.json"),
            Classification::Skip(SkipReason::Lockfile)
        );
    }

    #[test]
    fn test_size_ceiling() {
        let classifier = FileClassifier::new(&[], 100).unwrap();
        assert_eq!(
            classifier.classify("big.txt", Some(101)),
            Classification::Skip(SkipReason::TooLarge)
        );
        assert!(classifier.classify("big.txt", Some(100)).is_indexable());
        assert!(classifier.classify("big.txt", None).is_indexable());
    }

    #[test]
    fn test_custom_excludes() {
        let classifier =
            FileClassifier::new(&["docs/generated/**".to_string()], DEFAULT_MAX_FILE_BYTES)
                .unwrap();
        assert_eq!(
            classifier.classify("docs/generated/api.md", None),
            Classification::Skip(SkipReason::ExcludedPath)
        );
        assert!(classifier.classify("docs/guide.md", None).is_indexable());
    }

    #[test]
    fn test_custom_exclude_prunes_directory() {
        let classifier =
            FileClassifier::new(&["**/vendor".to_string()], DEFAULT_MAX_FILE_BYTES).unwrap();
        assert!(!classifier.should_descend("third_party/vendor"));
        assert!(classifier.should_descend("third_party"));
    }

    #[test]
    fn test_should_descend() {
        let classifier = FileClassifier::default();
        assert!(!classifier.should_descend(".git"));
        assert!(!classifier.should_descend("app/node_modules"));
        assert!(classifier.should_descend("src"));
    }

    #[test]
    fn test_invalid_glob_rejected() {
        assert!(FileClassifier::new(&["a[".to_string()], 10).is_err());
    }

    #[test]
    fn test_deterministic() {
        let classifier = FileClassifier::default();
        for path in ["src/lib.rs", ".git/config", "Cargo.lock", "img.png"] {
            assert_eq!(
                classifier.classify(path, Some(10)),
                classifier.classify(path, Some(10))
            );
        }
    }
}
