//! Filesystem mapper backend.
//!
//! Each document is one file, `<root>/<id>`. Writes go to a sibling staging
//! file `<root>/<id>.<uuid>.part` which is synced and renamed over the target
//! on commit; a reader that already opened the old file keeps reading it.
//! Staging names contain three dots, so they can never collide with a valid
//! document id; startup cleanup only removes names of exactly that shape.
//!
//! An update re-checks that its target still exists right before the rename.
//! A delete landing between that check and the rename is not detected, so on
//! this backend such an update can still recreate the document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::{validate_id, Document, DomainError};
use crate::mapper::{DocumentContent, DocumentDataMapper, MapperError, MapperResult, StagedWrite};

const STAGING_SUFFIX: &str = ".part";

/// `<id>.<32 hex digits>.part`, as produced by [`PhysicalDocumentDataMapper::stage`].
fn is_staging_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(STAGING_SUFFIX) else {
        return false;
    };
    let Some((id, token)) = stem.rsplit_once('.') else {
        return false;
    };
    token.len() == 32 && token.bytes().all(|b| b.is_ascii_hexdigit()) && validate_id(id).is_ok()
}

#[derive(Debug, Clone)]
pub struct PhysicalDocumentDataMapper {
    root: PathBuf,
}

impl PhysicalDocumentDataMapper {
    /// Open (creating if needed) the storage root and clear out staging files
    /// left behind by interrupted uploads.
    pub async fn open(root: impl AsRef<Path>) -> MapperResult<Self> {
        let root = root.as_ref().to_path_buf();
        let io_err = |e: std::io::Error| MapperError::io(root.display().to_string(), e);

        fs::create_dir_all(&root).await.map_err(io_err)?;

        let mut removed = 0usize;
        let mut entries = fs::read_dir(&root).await.map_err(io_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let name = entry.file_name();
            if is_staging_name(&name.to_string_lossy()) {
                if let Err(e) = fs::remove_file(entry.path()).await {
                    tracing::warn!(path = %entry.path().display(), error = %e, "Failed to remove stale staging file");
                } else {
                    removed += 1;
                }
            }
        }

        tracing::info!(root = %root.display(), stale_removed = removed, "Physical document store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the stored unit for `document_id`, or `None` for ids that can
    /// never be stored.
    fn path_for(&self, document_id: &str) -> Option<PathBuf> {
        validate_id(document_id).ok()?;
        Some(self.root.join(document_id))
    }

    async fn stage(&self, document_id: &str, target: PathBuf, replace_only: bool) -> MapperResult<Box<dyn StagedWrite>> {
        let staging = self
            .root
            .join(format!("{}.{}{}", document_id, Uuid::new_v4().simple(), STAGING_SUFFIX));
        let file = File::create(&staging)
            .await
            .map_err(|e| MapperError::io(document_id, e))?;

        tracing::debug!(document_id = %document_id, staging = %staging.display(), "Staged write opened");
        Ok(Box::new(FileStagedWrite {
            document_id: document_id.to_string(),
            file: Some(file),
            staging,
            target,
            written: 0,
            replace_only,
            committed: false,
        }))
    }
}

#[async_trait]
impl DocumentDataMapper for PhysicalDocumentDataMapper {
    fn backend(&self) -> &'static str {
        "physical"
    }

    fn document_for(&self, document_id: &str) -> Result<Document, DomainError> {
        let location = self.root.join(document_id);
        Document::physical(document_id, &location.to_string_lossy())
    }

    async fn begin_create(&self, document: &Document) -> MapperResult<Box<dyn StagedWrite>> {
        let target = self.root.join(document.id());
        if let Some(location) = document.location() {
            if Path::new(location) != target {
                tracing::debug!(
                    document_id = %document.id(),
                    location = %location,
                    "Document location differs from store layout; storing by id"
                );
            }
        }
        self.stage(document.id(), target, false).await
    }

    async fn begin_update(&self, document_id: &str) -> MapperResult<Box<dyn StagedWrite>> {
        let target = self
            .path_for(document_id)
            .ok_or_else(|| MapperError::NotInStore(document_id.to_string()))?;
        let exists = fs::try_exists(&target)
            .await
            .map_err(|e| MapperError::io(document_id, e))?;
        if !exists {
            return Err(MapperError::NotInStore(document_id.to_string()));
        }
        self.stage(document_id, target, true).await
    }

    async fn retrieve_document_by_id(&self, document_id: &str) -> MapperResult<Option<DocumentContent>> {
        let Some(path) = self.path_for(document_id) else {
            return Ok(None);
        };
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MapperError::io(document_id, e)),
        };
        let len = file
            .metadata()
            .await
            .map_err(|e| MapperError::io(document_id, e))?
            .len();
        Ok(Some(DocumentContent::new(file, Some(len))))
    }

    async fn delete_document(&self, document_id: &str) -> MapperResult<()> {
        let Some(path) = self.path_for(document_id) else {
            return Ok(());
        };
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(document_id = %document_id, "Removed physical document");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MapperError::io(document_id, e)),
        }
    }
}

struct FileStagedWrite {
    document_id: String,
    file: Option<File>,
    staging: PathBuf,
    target: PathBuf,
    written: u64,
    replace_only: bool,
    committed: bool,
}

#[async_trait]
impl StagedWrite for FileStagedWrite {
    async fn write_chunk(&mut self, chunk: &[u8]) -> MapperResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| MapperError::io(&self.document_id, std::io::Error::other("staged write closed")))?;
        file.write_all(chunk)
            .await
            .map_err(|e| MapperError::io(&self.document_id, e))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> MapperResult<u64> {
        let mut this = self;
        let id = this.document_id.clone();
        if let Some(mut file) = this.file.take() {
            file.flush().await.map_err(|e| MapperError::io(&id, e))?;
            file.sync_all().await.map_err(|e| MapperError::io(&id, e))?;
        }

        if this.replace_only && !fs::try_exists(&this.target).await.map_err(|e| MapperError::io(&id, e))? {
            return Err(MapperError::NotInStore(id));
        }

        fs::rename(&this.staging, &this.target)
            .await
            .map_err(|e| MapperError::io(&id, e))?;
        this.committed = true;

        tracing::debug!(document_id = %id, bytes = this.written, "Staged write committed");
        Ok(this.written)
    }
}

impl Drop for FileStagedWrite {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Close the handle before unlinking. Drop cannot await, so this is a
        // single blocking unlink on the current thread.
        drop(self.file.take());
        match std::fs::remove_file(&self.staging) {
            Ok(()) => tracing::debug!(document_id = %self.document_id, "Discarded staged write"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                document_id = %self.document_id,
                staging = %self.staging.display(),
                error = %e,
                "Failed to remove staging file"
            ),
        }
    }
}
