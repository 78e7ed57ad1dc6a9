//! Secure resource locator for stored document bodies.
//!
//! Recorded paths come from the document store and are not trusted. Before a
//! byte is read or a file removed, the path is normalized lexically (no
//! symlink resolution) and must land strictly inside the documents root.

use std::path::{Component, Path, PathBuf};

use crate::error::AuthError;

pub const INVALID_DOCUMENT_PATH: &str = "Invalid document path";
pub const DOCUMENT_NOT_FOUND: &str = "Document not found.";

#[derive(Debug, Clone)]
pub struct DocumentLocator {
    root: PathBuf,
    base: PathBuf,
}

impl DocumentLocator {
    /// `base` anchors relative recorded paths (normally the process working
    /// directory captured at startup).
    pub fn new(root: impl AsRef<Path>, base: impl AsRef<Path>) -> Self {
        let base = normalize(base.as_ref());
        let root = normalize(&base.join(root.as_ref()));
        Self { root, base }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical absolute path of a recorded document, if it is inside the root.
    pub fn locate(&self, recorded: impl AsRef<Path>) -> Result<PathBuf, AuthError> {
        let candidate = normalize(&self.base.join(recorded.as_ref()));

        if candidate != self.root && candidate.starts_with(&self.root) {
            Ok(candidate)
        } else {
            tracing::warn!(path = %candidate.display(), "document path outside documents root");
            Err(AuthError::forbidden(INVALID_DOCUMENT_PATH))
        }
    }

    /// [`locate`](Self::locate), then require the file to exist.
    pub async fn locate_existing(&self, recorded: impl AsRef<Path>) -> Result<PathBuf, AuthError> {
        let path = self.locate(recorded)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => {
                tracing::debug!(path = %path.display(), "document body missing");
                Err(AuthError::not_found(DOCUMENT_NOT_FOUND))
            }
        }
    }
}

/// Lexical normalization: drops `.`, folds `..` into its parent, never
/// climbs above the filesystem root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> DocumentLocator {
        DocumentLocator::new("/srv/app/shared/documents", "/srv/app")
    }

    #[test]
    fn path_outside_root_is_forbidden() {
        assert_eq!(
            locator().locate("/etc/passwd"),
            Err(AuthError::Forbidden(INVALID_DOCUMENT_PATH.to_string()))
        );
    }

    #[test]
    fn path_inside_root_is_returned_unchanged() {
        assert_eq!(
            locator().locate("/srv/app/shared/documents/abc.pdf"),
            Ok(PathBuf::from("/srv/app/shared/documents/abc.pdf"))
        );
    }

    #[test]
    fn traversal_is_folded_before_containment() {
        assert!(locator()
            .locate("/srv/app/shared/documents/../../../etc/passwd")
            .is_err());
        assert_eq!(
            locator().locate("/srv/app/shared/documents/sub/../abc.pdf"),
            Ok(PathBuf::from("/srv/app/shared/documents/abc.pdf"))
        );
    }

    #[test]
    fn sibling_with_common_prefix_is_forbidden() {
        assert!(locator().locate("/srv/app/shared/documents-evil/abc.pdf").is_err());
    }

    #[test]
    fn root_itself_is_not_strictly_inside() {
        assert!(locator().locate("/srv/app/shared/documents").is_err());
        assert!(locator().locate("/srv/app/shared/documents/.").is_err());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        assert_eq!(
            locator().locate("shared/documents/abc.pdf"),
            Ok(PathBuf::from("/srv/app/shared/documents/abc.pdf"))
        );
        assert!(locator().locate("../etc/passwd").is_err());
    }

    #[tokio::test]
    async fn existing_file_is_located_and_missing_file_is_not_found() {
        let dir = std::env::temp_dir().join(format!("jktdocs-locator-{}", std::process::id()));
        let root = dir.join("documents");
        std::fs::create_dir_all(&root).unwrap();
        let file = root.join("present.pdf");
        std::fs::write(&file, b"%PDF").unwrap();

        let locator = DocumentLocator::new(&root, &dir);
        assert_eq!(locator.locate_existing(&file).await, Ok(file.clone()));
        assert_eq!(
            locator.locate_existing(root.join("absent.pdf")).await,
            Err(AuthError::NotFound(DOCUMENT_NOT_FOUND.to_string()))
        );
        // Containment still wins over existence.
        assert!(matches!(
            locator.locate_existing("/etc/passwd").await,
            Err(AuthError::Forbidden(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
