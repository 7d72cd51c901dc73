//! Attachment service (news images and documents).

use std::sync::Arc;

use aac_common::{AppError, AppResult, IdGenerator, StorageBackend};
use aac_db::{
    entities::news_attachment,
    repositories::{AttachmentRepository, NewsRepository},
};
use bytes::Bytes;
use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;
use tracing::{info, warn};

/// Maximum attachment size (10 MiB).
pub const MAX_ATTACHMENT_SIZE: usize = 10 * 1024 * 1024;

/// MIME types accepted for attachments.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

const KEY_SUFFIX_LEN: usize = 11;

/// Longest display name the `file_name` column holds, in characters.
pub const MAX_FILE_NAME_LEN: usize = 512;

/// One file of a multi-file upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Name sent by the client.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

/// An attachment with its public URL and display size.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentView {
    #[serde(flatten)]
    pub attachment: news_attachment::Model,
    pub url: String,
    pub size_label: String,
}

/// Attachments of a news item, split by kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttachmentList {
    /// Gallery images.
    pub images: Vec<AttachmentView>,
    /// Downloadable documents.
    pub documents: Vec<AttachmentView>,
}

/// Service for news attachments.
#[derive(Clone)]
pub struct AttachmentService {
    attachment_repo: AttachmentRepository,
    news_repo: NewsRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl AttachmentService {
    /// Create a new attachment service.
    #[must_use]
    pub fn new(
        attachment_repo: AttachmentRepository,
        news_repo: NewsRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            attachment_repo,
            news_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Upload files and attach them to a news item as one unit.
    ///
    /// Every file is checked before anything is stored. Each object is written
    /// before its row; if an insert fails, that object and every attachment
    /// already created in the batch are removed before the error is returned.
    pub async fn upload(
        &self,
        news_id: &str,
        files: Vec<UploadFile>,
    ) -> AppResult<Vec<AttachmentView>> {
        if files.is_empty() {
            return Err(AppError::BadRequest("No file in upload".to_string()));
        }
        for file in &files {
            check_upload(&file.content_type, file.data.len())?;
        }
        self.news_repo.get_by_id(news_id).await?;

        let mut uploaded = Vec::with_capacity(files.len());
        let mut created: Vec<(String, String)> = Vec::with_capacity(files.len());
        for file in files {
            let key = self.object_key(news_id, &file);
            match self.store(news_id, &key, file).await {
                Ok(view) => {
                    created.push((view.attachment.id.clone(), key));
                    uploaded.push(view);
                }
                Err(e) => {
                    self.discard(news_id, &created).await;
                    return Err(e);
                }
            }
        }
        Ok(uploaded)
    }

    fn object_key(&self, news_id: &str, file: &UploadFile) -> String {
        format!(
            "{news_id}/{}_{}.{}",
            Utc::now().timestamp_millis(),
            self.id_gen.generate_suffix(KEY_SUFFIX_LEN),
            extension_for(&file.file_name, &file.content_type)
        )
    }

    async fn store(&self, news_id: &str, key: &str, file: UploadFile) -> AppResult<AttachmentView> {
        let size = file.data.len();
        let stored = self.storage.upload(key, file.data, &file.content_type).await?;

        let model = news_attachment::ActiveModel {
            id: Set(self.id_gen.generate()),
            news_id: Set(news_id.to_string()),
            file_name: Set(display_name(&file.file_name)),
            file_path: Set(key.to_string()),
            file_type: Set(file.content_type),
            file_size: Set(size as i64),
            created_at: Set(Utc::now()),
        };

        let attachment = match self.attachment_repo.create(model).await {
            Ok(attachment) => attachment,
            Err(e) => {
                if let Err(cleanup) = self.storage.remove(&[key.to_string()]).await {
                    warn!(storage_key = %key, error = %cleanup, "Failed to remove object after insert failure");
                }
                return Err(e);
            }
        };

        info!(
            news_id = %news_id,
            attachment_id = %attachment.id,
            storage_key = %key,
            size = size,
            "Attachment uploaded"
        );

        Ok(AttachmentView {
            url: stored.url,
            size_label: format_file_size(size as u64),
            attachment,
        })
    }

    /// Remove attachments created earlier in a failed batch, as `(id, key)` pairs.
    async fn discard(&self, news_id: &str, created: &[(String, String)]) {
        if created.is_empty() {
            return;
        }
        // An object is only removed once its row is gone.
        let mut keys = Vec::with_capacity(created.len());
        for (id, key) in created {
            match self.attachment_repo.delete(id).await {
                Ok(_) => keys.push(key.clone()),
                Err(e) => {
                    warn!(attachment_id = %id, storage_key = %key, error = %e, "Failed to delete attachment row of failed upload");
                }
            }
        }
        if let Err(e) = self.storage.remove(&keys).await {
            warn!(news_id = %news_id, error = %e, "Failed to remove objects of failed upload");
        }
        info!(news_id = %news_id, count = created.len(), "Partial upload rolled back");
    }

    /// List the attachments of a news item, split into images and documents.
    pub async fn list(&self, news_id: &str) -> AppResult<AttachmentList> {
        let mut list = AttachmentList::default();
        for attachment in self.attachment_repo.find_by_news(news_id).await? {
            let view = self.view(attachment);
            if view.attachment.is_image() {
                list.images.push(view);
            } else {
                list.documents.push(view);
            }
        }
        Ok(list)
    }

    /// Fetch an attachment and its bytes.
    pub async fn download(&self, id: &str) -> AppResult<(news_attachment::Model, Bytes)> {
        let attachment = self.attachment_repo.get_by_id(id).await?;
        let data = self.storage.download(&attachment.file_path).await?;
        Ok((attachment, data))
    }

    /// Delete an attachment.
    ///
    /// The record goes first; a failure to remove the object afterwards is
    /// only logged.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let attachment = self.attachment_repo.get_by_id(id).await?;

        if !self.attachment_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Attachment not found: {id}")));
        }

        if let Err(e) = self
            .storage
            .remove(std::slice::from_ref(&attachment.file_path))
            .await
        {
            warn!(
                attachment_id = %id,
                storage_key = %attachment.file_path,
                error = %e,
                "Failed to remove attachment object, leaving orphan in storage"
            );
        }

        info!(attachment_id = %id, news_id = %attachment.news_id, "Attachment deleted");
        Ok(())
    }

    fn view(&self, attachment: news_attachment::Model) -> AttachmentView {
        AttachmentView {
            url: self.storage.public_url(&attachment.file_path),
            size_label: format_file_size(attachment.file_size.max(0) as u64),
            attachment,
        }
    }
}

/// Check type and size of an upload.
pub fn check_upload(content_type: &str, size: usize) -> AppResult<()> {
    if size == 0 {
        return Err(AppError::BadRequest("File is empty".to_string()));
    }
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(AppError::UnsupportedMediaType(format!(
            "{content_type} is not allowed; use JPEG, PNG, GIF, WebP or PDF"
        )));
    }
    if size > MAX_ATTACHMENT_SIZE {
        return Err(AppError::PayloadTooLarge(format!(
            "{} exceeds the {} limit",
            format_file_size(size as u64),
            format_file_size(MAX_ATTACHMENT_SIZE as u64)
        )));
    }
    Ok(())
}

/// Format a byte count for display: `0 Bytes`, `1.5 KB`, `10 MB`.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Extension of the stored key: the file's own when usable, else one for the type.
fn extension_for(file_name: &str, content_type: &str) -> String {
    let own = file_name
        .rsplit_once('.')
        .map(|(stem, ext)| (stem, ext.to_ascii_lowercase()))
        .filter(|(stem, ext)| {
            !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 10
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|(_, ext)| ext);

    own.unwrap_or_else(|| {
        match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "application/pdf" => "pdf",
            _ => "bin",
        }
        .to_string()
    })
}

/// File name as shown to users: no directory part, at most
/// [`MAX_FILE_NAME_LEN`] characters with a short extension kept.
fn display_name(file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name).trim();
    if name.is_empty() {
        return "file".to_string();
    }
    if name.chars().count() <= MAX_FILE_NAME_LEN {
        return name.to_string();
    }

    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.chars().count() <= 10 => {
            let keep = MAX_FILE_NAME_LEN - ext.chars().count() - 1;
            let stem: String = stem.chars().take(keep).collect();
            format!("{stem}.{ext}")
        }
        _ => name.chars().take(MAX_FILE_NAME_LEN).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use aac_common::MemoryStorage;
    use aac_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    fn service(db: MockDatabase, storage: Arc<MemoryStorage>) -> AttachmentService {
        let conn = Arc::new(db.into_connection());
        AttachmentService::new(
            AttachmentRepository::new(conn.clone()),
            NewsRepository::new(conn),
            storage,
        )
    }

    fn memory() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new("news-attachments", "/files"))
    }

    fn upload_file(name: &str, content_type: &str, data: &'static [u8]) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn test_check_upload() {
        assert!(check_upload("image/png", 100).is_ok());
        assert!(matches!(
            check_upload("image/svg+xml", 100),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            check_upload("application/pdf", MAX_ATTACHMENT_SIZE + 1),
            Err(AppError::PayloadTooLarge(_))
        ));
        assert!(check_upload("application/pdf", MAX_ATTACHMENT_SIZE).is_ok());
        assert!(matches!(check_upload("image/png", 0), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("Catalog.PDF", "application/pdf"), "pdf");
        assert_eq!(extension_for("photo", "image/jpeg"), "jpg");
        assert_eq!(extension_for(".hidden", "image/png"), "png");
        assert_eq!(display_name("C:\\Users\\me\\lens.png"), "lens.png");
    }

    #[test]
    fn test_display_name_fits_column() {
        let long = format!("{}.pdf", "目".repeat(600));
        let name = display_name(&long);
        assert_eq!(name.chars().count(), MAX_FILE_NAME_LEN);
        assert!(name.ends_with(".pdf"));

        let no_ext = "x".repeat(700);
        assert_eq!(display_name(&no_ext).chars().count(), MAX_FILE_NAME_LEN);
        assert_eq!(display_name("catalog.pdf"), "catalog.pdf");
    }

    #[tokio::test]
    async fn test_upload_checks_every_file_first() {
        let storage = memory();
        let db = MockDatabase::new(DatabaseBackend::Postgres);
        let svc = service(db, storage.clone());

        let err = svc
            .upload(
                "n1",
                vec![
                    upload_file("lens.png", "image/png", b"\x89PNG"),
                    upload_file("x.svg", "image/svg+xml", b"<svg/>"),
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_rolls_back_created_attachments() {
        let storage = memory();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::news("n1", true, 0)]])
            .append_query_results([[fixtures::attachment("a1", "n1", "image/png")]])
            .append_query_errors([DbErr::Custom("insert failed".to_string())])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        let svc = service(db, storage.clone());

        let err = svc
            .upload(
                "n1",
                vec![
                    upload_file("lens.png", "image/png", b"\x89PNG"),
                    upload_file("spec.pdf", "application/pdf", b"%PDF"),
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_stores_all_files() {
        let storage = memory();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::news("n1", true, 0)]])
            .append_query_results([[fixtures::attachment("a1", "n1", "image/png")]])
            .append_query_results([[fixtures::attachment("a2", "n1", "application/pdf")]]);
        let svc = service(db, storage.clone());

        let views = svc
            .upload(
                "n1",
                vec![
                    upload_file("lens.png", "image/png", b"\x89PNG"),
                    upload_file("spec.pdf", "application/pdf", b"%PDF"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(storage.keys().await.len(), 2);
    }

    #[tokio::test]
    async fn test_upload_stores_object_and_row() {
        let storage = memory();
        let row = fixtures::attachment("a1", "n1", "image/png");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::news("n1", true, 0)]])
            .append_query_results([[row.clone()]]);
        let svc = service(db, storage.clone());

        let view = svc
            .upload("n1", vec![upload_file("lens.png", "image/png", b"\x89PNG")])
            .await
            .unwrap()
            .remove(0);

        assert_eq!(view.attachment.id, "a1");
        let keys = storage.keys().await;
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("n1/"));
        assert!(keys[0].ends_with(".png"));
        assert!(view.url.starts_with("/files/news-attachments/n1/"));
    }

    #[tokio::test]
    async fn test_upload_removes_object_when_insert_fails() {
        let storage = memory();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::news("n1", true, 0)]])
            .append_query_errors([DbErr::Custom("insert failed".to_string())]);
        let svc = service(db, storage.clone());

        let err = svc
            .upload("n1", vec![upload_file("doc.pdf", "application/pdf", b"%PDF")])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_unknown_news() {
        let storage = memory();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<aac_db::entities::news::Model>::new()]);
        let svc = service(db, storage.clone());

        let err = svc
            .upload("missing", vec![upload_file("a.png", "image/png", b"png")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_splits_images_and_documents() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            fixtures::attachment("a1", "n1", "image/png"),
            fixtures::attachment("a2", "n1", "application/pdf"),
            fixtures::attachment("a3", "n1", "image/webp"),
        ]]);
        let svc = service(db, memory());

        let list = svc.list("n1").await.unwrap();
        assert_eq!(list.images.len(), 2);
        assert_eq!(list.documents.len(), 1);
        assert_eq!(list.documents[0].size_label, "1.5 KB");
    }

    #[tokio::test]
    async fn test_delete_survives_missing_object() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::attachment("a1", "n1", "image/png")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        let svc = service(db, memory());

        assert!(svc.delete("a1").await.is_ok());
    }

    #[tokio::test]
    async fn test_download_returns_bytes() {
        let storage = memory();
        let attachment = fixtures::attachment("a2", "n1", "application/pdf");
        storage
            .upload(&attachment.file_path, Bytes::from_static(b"%PDF-1.7"), "application/pdf")
            .await
            .unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[attachment.clone()]]);
        let svc = service(db, storage);

        let (found, data) = svc.download("a2").await.unwrap();
        assert_eq!(found.file_name, attachment.file_name);
        assert_eq!(&data[..], b"%PDF-1.7");
    }
}
