use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while listing a directory
#[derive(Debug, thiserror::Error)]
pub(crate) enum WalkError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("entry name is not valid UTF-8: {}", .0.display())]
    NonUtf8Name(PathBuf),
}

/// An immediate subdirectory
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Folder {
    pub name: String,
    /// False for symlinked directories, which are listed but never entered
    pub descend: bool,
}

/// Immediate children of one directory
#[derive(Debug, Clone, Default)]
pub(crate) struct Listing {
    pub files: Vec<String>,
    pub folders: Vec<Folder>,
}

impl Listing {
    /// Whether a file or folder called `name` exists in this listing
    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f == name) || self.folders.iter().any(|f| f.name == name)
    }
}

/// List the immediate children of `dir`, sorted by name.
///
/// Entries are classified by following symlinks. An entry whose target
/// cannot be inspected counts as a file, so reading it later fails loudly.
pub(crate) fn list_dir(dir: &Path) -> Result<Listing, WalkError> {
    let io_err = |source| WalkError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut listing = Listing::default();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| WalkError::NonUtf8Name(path.clone()))?;

        let file_type = entry.file_type().map_err(io_err)?;
        if file_type.is_dir() {
            listing.folders.push(Folder {
                name,
                descend: true,
            });
        } else if file_type.is_symlink() && fs::metadata(&path).is_ok_and(|m| m.is_dir()) {
            listing.folders.push(Folder {
                name,
                descend: false,
            });
        } else {
            listing.files.push(name);
        }
    }

    listing.files.sort();
    listing.folders.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(listing)
}

/// One directory reached by a [`TreeWalk`]
#[derive(Debug)]
pub(crate) struct Visit {
    pub dir: PathBuf,
    pub listing: Listing,
}

/// Top-down, depth-first walk over a directory tree.
///
/// A directory is yielded before any of its subdirectories, and a subtree
/// is exhausted before its next sibling is entered.
#[derive(Debug)]
pub(crate) struct TreeWalk {
    stack: Vec<PathBuf>,
}

impl TreeWalk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            stack: vec![root.into()],
        }
    }

    /// Whether directories remain that have not been yielded yet
    pub fn has_pending(&self) -> bool {
        !self.stack.is_empty()
    }
}

impl Iterator for TreeWalk {
    type Item = Result<Visit, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        let dir = self.stack.pop()?;
        let listing = match list_dir(&dir) {
            Ok(listing) => listing,
            Err(e) => {
                // nothing below an unreadable directory can be reached
                self.stack.clear();
                return Some(Err(e));
            }
        };

        self.stack.extend(
            listing
                .folders
                .iter()
                .rev()
                .filter(|folder| folder.descend)
                .map(|folder| dir.join(&folder.name)),
        );
        Some(Ok(Visit { dir, listing }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tree() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/aa")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join("top.txt"), b"top").unwrap();
        fs::write(root.join("a/one.txt"), b"one").unwrap();
        fs::write(root.join("a/aa/two.txt"), b"two").unwrap();
        temp
    }

    #[test]
    fn test_list_dir_splits_files_and_folders() {
        let temp = tree();
        let listing = list_dir(temp.path()).unwrap();
        assert_eq!(listing.files, vec!["top.txt".to_string()]);
        let folders: Vec<_> = listing.folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(folders, vec!["a", "b"]);
        assert!(listing.contains("a"));
        assert!(listing.contains("top.txt"));
        assert!(!listing.contains("one.txt"));
    }

    #[test]
    fn test_walk_visits_parents_first() {
        let temp = tree();
        let root = temp.path();
        let visited: Vec<PathBuf> = TreeWalk::new(root).map(|v| v.unwrap().dir).collect();

        assert_eq!(visited.first().map(PathBuf::as_path), Some(root));
        let mut expected = vec![
            root.to_path_buf(),
            root.join("a"),
            root.join("a/aa"),
            root.join("b"),
        ];
        let mut sorted = visited.clone();
        sorted.sort();
        expected.sort();
        assert_eq!(sorted, expected);

        for (i, dir) in visited.iter().enumerate().skip(1) {
            let parent = dir.parent().unwrap();
            assert!(visited[..i].iter().any(|seen| seen == parent));
        }
    }

    #[test]
    fn test_walk_reports_pending() {
        let temp = tree();
        let mut walk = TreeWalk::new(temp.path());
        walk.next().unwrap().unwrap();
        assert!(walk.has_pending());
        let rest: Vec<_> = walk.by_ref().collect();
        assert_eq!(rest.len(), 3);
        assert!(!walk.has_pending());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let mut walk = TreeWalk::new(temp.path().join("missing"));
        assert!(matches!(walk.next(), Some(Err(WalkError::Io { .. }))));
        assert!(walk.next().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_folders_are_not_entered() {
        let temp = tree();
        let root = temp.path();
        std::os::unix::fs::symlink(root.join("a"), root.join("b/link")).unwrap();

        let listing = list_dir(&root.join("b")).unwrap();
        assert_eq!(
            listing.folders,
            vec![Folder {
                name: "link".to_string(),
                descend: false,
            }]
        );

        let visited = TreeWalk::new(root).count();
        assert_eq!(visited, 4);
    }
}
