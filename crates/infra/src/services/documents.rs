use std::sync::Arc;

use chrono::Utc;

use jktdocs_auth::DocumentLocator;
use jktdocs_auth::locator::DOCUMENT_NOT_FOUND;
use jktdocs_core::{DocumentId, UserId};

use super::ServiceError;
use crate::pagination::{Page, PageRequest};
use crate::store::{DocumentRecord, DocumentStore};

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Keep only characters that are safe inside a single path component.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn io_error(e: std::io::Error) -> ServiceError {
    ServiceError::Io(e.to_string())
}

#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    locator: DocumentLocator,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, locator: DocumentLocator) -> Self {
        Self { store, locator }
    }

    pub async fn upload(&self, owner: UserId, file: UploadedFile) -> Result<DocumentRecord, ServiceError> {
        let id = DocumentId::new();
        let stored_name = format!("{}-{}", id, sanitize_file_name(&file.file_name));
        let path = self.locator.locate(self.locator.root().join(&stored_name))?;

        tokio::fs::create_dir_all(self.locator.root()).await.map_err(io_error)?;
        tokio::fs::write(&path, &file.bytes).await.map_err(io_error)?;

        let now = Utc::now();
        let doc = DocumentRecord {
            id,
            name: file.file_name,
            url: format!("/documents/{stored_name}"),
            mimetype: file
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size: file.bytes.len() as u64,
            path: path.to_string_lossy().into_owned(),
            user_id: Some(owner),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.store.insert_document(doc.clone()).await {
            tracing::error!(document_id = %id, error = %e, "failed to record upload");
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %rm, "orphaned upload left on disk");
            }
            return Err(e.into());
        }

        tracing::info!(document_id = %id, size = doc.size, "document uploaded");
        Ok(doc)
    }

    pub async fn list(&self, owner: Option<UserId>, page: PageRequest) -> Result<Page<DocumentRecord>, ServiceError> {
        let mut docs = self.store.list_documents(owner).await?;
        page.sort(&mut docs);
        Ok(Page::from_items(docs, page))
    }

    /// Metadata only; the body is not touched.
    pub async fn get(&self, id: DocumentId) -> Result<DocumentRecord, ServiceError> {
        self.store
            .get_document(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(DOCUMENT_NOT_FOUND))
    }

    /// Metadata plus body. The recorded path is checked before any read.
    pub async fn open(&self, id: DocumentId) -> Result<(DocumentRecord, Vec<u8>), ServiceError> {
        let doc = self.get(id).await?;
        let path = self.locator.locate_existing(&doc.path).await?;

        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            tracing::error!(document_id = %id, error = %e, "document read failed");
            io_error(e)
        })?;
        Ok((doc, bytes))
    }

    /// Remove body then record. The recorded path is checked before removal.
    pub async fn delete(&self, id: DocumentId) -> Result<(), ServiceError> {
        let doc = self.get(id).await?;
        let path = self.locator.locate_existing(&doc.path).await?;

        tokio::fs::remove_file(&path).await.map_err(|e| {
            tracing::error!(document_id = %id, error = %e, "document removal failed");
            io_error(e)
        })?;
        self.store.delete_document(id).await?;

        tracing::info!(document_id = %id, path = %path.display(), "document deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use jktdocs_auth::AuthError;
    use jktdocs_auth::locator::INVALID_DOCUMENT_PATH;

    use super::*;
    use crate::store::InMemoryStore;

    struct Fixture {
        svc: DocumentService,
        store: Arc<InMemoryStore>,
        dir: PathBuf,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    fn fixture(tag: &str) -> Fixture {
        let dir = std::env::temp_dir().join(format!("jktdocs-docs-{tag}-{}", std::process::id()));
        let store = Arc::new(InMemoryStore::new());
        let locator = DocumentLocator::new(dir.join("documents"), &dir);
        Fixture {
            svc: DocumentService::new(store.clone(), locator),
            store,
            dir,
        }
    }

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: b"%PDF-1.7".to_vec(),
        }
    }

    async fn record_with_path(store: &InMemoryStore, path: &str) -> DocumentId {
        let now = Utc::now();
        let id = DocumentId::new();
        store
            .insert_document(DocumentRecord {
                id,
                name: "planted".to_string(),
                url: String::new(),
                mimetype: "text/plain".to_string(),
                size: 0,
                path: path.to_string(),
                user_id: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        id
    }

    #[test]
    fn file_names_are_flattened() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("report 2024.pdf"), "report_2024.pdf");
        assert_eq!(sanitize_file_name(".."), "upload");
    }

    #[tokio::test]
    async fn upload_open_delete_lifecycle() {
        let f = fixture("lifecycle");
        let owner = UserId::new();
        let doc = f.svc.upload(owner, file("contract.pdf")).await.unwrap();
        assert_eq!(doc.user_id, Some(owner));
        assert_eq!(doc.size, 8);

        let (meta, bytes) = f.svc.open(doc.id).await.unwrap();
        assert_eq!(meta.name, "contract.pdf");
        assert_eq!(bytes, b"%PDF-1.7");

        f.svc.delete(doc.id).await.unwrap();
        assert!(!std::path::Path::new(&doc.path).exists());
        assert_eq!(f.store.get_document(doc.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn record_pointing_outside_root_is_forbidden() {
        let f = fixture("outside");
        let id = record_with_path(&f.store, "/etc/passwd").await;

        let expected = ServiceError::Auth(AuthError::Forbidden(INVALID_DOCUMENT_PATH.to_string()));
        assert_eq!(f.svc.open(id).await.unwrap_err(), expected);
        assert_eq!(f.svc.delete(id).await.unwrap_err(), expected);
        // Metadata fetch is unaffected.
        assert!(f.svc.get(id).await.is_ok());
        assert!(f.store.get_document(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_body_is_not_found_only_when_streaming_or_deleting() {
        let f = fixture("missing");
        let path = f.dir.join("documents").join("gone.pdf");
        let id = record_with_path(&f.store, &path.to_string_lossy()).await;

        assert!(f.svc.get(id).await.is_ok());
        assert_eq!(f.svc.open(id).await.unwrap_err(), ServiceError::not_found(DOCUMENT_NOT_FOUND));
        assert_eq!(f.svc.delete(id).await.unwrap_err(), ServiceError::not_found(DOCUMENT_NOT_FOUND));
    }

    #[tokio::test]
    async fn listing_filters_by_owner() {
        let f = fixture("list");
        let a = UserId::new();
        let b = UserId::new();
        f.svc.upload(a, file("a.pdf")).await.unwrap();
        f.svc.upload(b, file("b.pdf")).await.unwrap();

        let page = f.svc.list(Some(a), PageRequest::default()).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "a.pdf");
        assert_eq!(f.svc.list(None, PageRequest::default()).await.unwrap().meta.item_count, 2);
    }
}
