//! Add/edit/delete path for admins
//!
//! Order for add and edit: admin check, in-flight token, text validation,
//! uploads, then a single catalog write. A failed upload leaves the catalog
//! exactly as it was. Locks are not held while uploading.

use tracing::info;

use crate::catalog::{VideoDraft, VideoEntry};
use crate::error::{ArchiveError, Result};
use crate::session::Session;
use crate::upload::{ImageFile, ImageSlot, ImageUploader};

/// Draft text plus any newly selected screenshots
#[derive(Debug, Clone, Default)]
pub struct EntryForm {
    pub draft: VideoDraft,
    pub primary_file: Option<ImageFile>,
    pub secondary_file: Option<ImageFile>,
}

impl EntryForm {
    pub fn new(draft: VideoDraft) -> Self {
        Self {
            draft,
            ..Self::default()
        }
    }

    pub fn with_primary_file(mut self, file: ImageFile) -> Self {
        self.primary_file = Some(file);
        self
    }

    pub fn with_secondary_file(mut self, file: ImageFile) -> Self {
        self.secondary_file = Some(file);
        self
    }
}

async fn require_admin(session: &Session) -> Result<String> {
    let auth = session.auth.read().await;
    auth.require_admin().map(|identity| identity.email.clone())
}

/// Upload the form's files into the draft's image slots
async fn resolve_images(uploader: &ImageUploader, form: EntryForm) -> Result<VideoDraft> {
    let EntryForm {
        mut draft,
        primary_file,
        secondary_file,
    } = form;

    if let Some(file) = primary_file {
        draft.primary_image = Some(uploader.upload(&file, ImageSlot::Primary).await?);
    }
    if let Some(file) = secondary_file {
        draft.secondary_image = Some(uploader.upload(&file, ImageSlot::Secondary).await?);
    }
    Ok(draft)
}

/// Create a new entry
pub async fn create(
    session: &Session,
    uploader: &ImageUploader,
    form: EntryForm,
) -> Result<VideoEntry> {
    let admin = require_admin(session).await?;
    let _token = session.begin_submission()?;

    let mut form = form;
    form.draft = form.draft.normalized();
    form.draft.validate_required()?;
    if form.primary_file.is_none() && form.draft.primary_image.is_none() {
        return Err(ArchiveError::Validation(
            "primary_image is required".to_string(),
        ));
    }

    let draft = resolve_images(uploader, form).await?;
    let entry = session.catalog.write().await.add(draft)?;

    info!(session = %session.id(), admin = %admin, id = %entry.id, "Video submitted");
    Ok(entry)
}

/// Replace an entry's content; empty image slots keep their URLs
pub async fn edit(
    session: &Session,
    uploader: &ImageUploader,
    id: &str,
    form: EntryForm,
) -> Result<VideoEntry> {
    let admin = require_admin(session).await?;
    let _token = session.begin_submission()?;

    session.catalog.read().await.get(id)?;

    let mut form = form;
    form.draft = form.draft.normalized();
    form.draft.validate_required()?;

    let draft = resolve_images(uploader, form).await?;
    let entry = session.catalog.write().await.update(id, draft)?;

    info!(session = %session.id(), admin = %admin, id = %entry.id, "Video edited");
    Ok(entry)
}

/// Delete an entry
pub async fn delete(session: &Session, id: &str) -> Result<VideoEntry> {
    let admin = require_admin(session).await?;
    let removed = session.catalog.write().await.remove(id)?;

    info!(session = %session.id(), admin = %admin, id = %removed.id, "Video deleted");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::auth::{AdminPolicy, Identity, IdentityProvider, INVALID_CREDENTIALS};
    use crate::catalog::CatalogStore;
    use crate::session::SessionRegistry;
    use crate::upload::{MemoryObjectStore, ObjectStore};

    const ADMIN: &str = "admin@example.com";

    struct AnyPassword;

    #[async_trait]
    impl IdentityProvider for AnyPassword {
        async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
            if password.is_empty() {
                return Err(ArchiveError::Auth(INVALID_CREDENTIALS.to_string()));
            }
            Ok(Identity {
                id: email.to_string(),
                email: email.to_string(),
            })
        }
    }

    /// Fails any upload for the given slot ordinal
    struct FailingStore {
        inner: MemoryObjectStore,
        fail_ordinal: u8,
    }

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn upload(
            &self,
            bucket: &str,
            object_name: &str,
            data: &[u8],
            content_type: &str,
            upsert: bool,
        ) -> Result<String> {
            if object_name.contains(&format!("_{}_", self.fail_ordinal)) {
                return Err(ArchiveError::Upload("HTTP 500: boom".to_string()));
            }
            self.inner
                .upload(bucket, object_name, data, content_type, upsert)
                .await
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            self.inner.public_url(bucket, path)
        }
    }

    async fn admin_session() -> Arc<Session> {
        let registry = SessionRegistry::new(
            CatalogStore::new(),
            AdminPolicy::new(ADMIN),
            Duration::from_secs(60),
        );
        let (_, session) = registry.open();
        session
            .auth
            .write()
            .await
            .sign_in(&AnyPassword, ADMIN, "pw")
            .await
            .unwrap();
        session
    }

    fn memory_uploader() -> ImageUploader {
        ImageUploader::new(Arc::new(MemoryObjectStore::new()), "screenshots", 1024)
    }

    fn failing_uploader(fail_ordinal: u8) -> ImageUploader {
        let store = FailingStore {
            inner: MemoryObjectStore::new(),
            fail_ordinal,
        };
        ImageUploader::new(Arc::new(store), "screenshots", 1024)
    }

    fn png(name: &str) -> ImageFile {
        ImageFile::new(name, "image/png", b"png".to_vec())
    }

    fn form() -> EntryForm {
        EntryForm::new(VideoDraft::new("Rain", "https://x/v1"))
    }

    #[tokio::test]
    async fn test_create_uploads_then_adds() {
        let session = admin_session().await;
        let entry = create(
            &session,
            &memory_uploader(),
            form()
                .with_primary_file(png("a.png"))
                .with_secondary_file(png("b.png")),
        )
        .await
        .unwrap();

        assert!(entry.primary_image.ends_with("_1_a.png"));
        assert!(entry.secondary_image.as_deref().unwrap().ends_with("_2_b.png"));
        assert_eq!(session.catalog.read().await.list()[0], entry);
        assert!(!session.is_submitting());
    }

    #[tokio::test]
    async fn test_create_needs_a_primary_image() {
        let session = admin_session().await;
        let err = create(&session, &memory_uploader(), form()).await.unwrap_err();

        assert_eq!(
            err,
            ArchiveError::Validation("primary_image is required".to_string())
        );
        assert!(session.catalog.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_accepts_existing_url() {
        let session = admin_session().await;
        let mut form = form();
        form.draft.primary_image = Some("https://x/img1.png".to_string());

        let entry = create(&session, &memory_uploader(), form).await.unwrap();
        assert_eq!(entry.primary_image, "https://x/img1.png");
    }

    #[tokio::test]
    async fn test_failed_upload_writes_nothing() {
        for ordinal in [1, 2] {
            let session = admin_session().await;
            let err = create(
                &session,
                &failing_uploader(ordinal),
                form()
                    .with_primary_file(png("a.png"))
                    .with_secondary_file(png("b.png")),
            )
            .await
            .unwrap_err();

            assert!(matches!(err, ArchiveError::Upload(_)));
            assert!(session.catalog.read().await.is_empty());
            assert!(!session.is_submitting(), "token released after failure");
        }
    }

    #[tokio::test]
    async fn test_busy_session_rejects_second_submission() {
        let session = admin_session().await;
        let _held = session.begin_submission().unwrap();

        let err = create(
            &session,
            &memory_uploader(),
            form().with_primary_file(png("a.png")),
        )
        .await
        .unwrap_err();

        assert_eq!(err, ArchiveError::Busy);
        assert!(session.catalog.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_non_admin_cannot_change_anything() {
        let session = admin_session().await;
        let entry = create(
            &session,
            &memory_uploader(),
            form().with_primary_file(png("a.png")),
        )
        .await
        .unwrap();

        session
            .auth
            .write()
            .await
            .sign_in(&AnyPassword, "visitor@example.com", "pw")
            .await
            .unwrap();

        let uploader = memory_uploader();
        assert_eq!(
            create(&session, &uploader, form().with_primary_file(png("b.png")))
                .await
                .unwrap_err(),
            ArchiveError::AdminRequired
        );
        assert_eq!(
            edit(&session, &uploader, &entry.id, form()).await.unwrap_err(),
            ArchiveError::AdminRequired
        );
        assert_eq!(
            delete(&session, &entry.id).await.unwrap_err(),
            ArchiveError::AdminRequired
        );
        assert_eq!(session.catalog.read().await.list(), &[entry]);
    }

    #[tokio::test]
    async fn test_edit_keeps_images_without_replacement() {
        let session = admin_session().await;
        let uploader = memory_uploader();
        let entry = create(
            &session,
            &uploader,
            form()
                .with_primary_file(png("a.png"))
                .with_secondary_file(png("b.png")),
        )
        .await
        .unwrap();

        let edited = edit(
            &session,
            &uploader,
            &entry.id,
            EntryForm::new(VideoDraft::new("Rain (remaster)", "https://x/v2"))
                .with_secondary_file(png("c.png")),
        )
        .await
        .unwrap();

        assert_eq!(edited.id, entry.id);
        assert_eq!(edited.date_added, entry.date_added);
        assert_eq!(edited.title, "Rain (remaster)");
        assert_eq!(edited.primary_image, entry.primary_image);
        assert!(edited.secondary_image.as_deref().unwrap().ends_with("_2_c.png"));
    }

    #[tokio::test]
    async fn test_edit_unknown_id_uploads_nothing() {
        let session = admin_session().await;
        let store = Arc::new(MemoryObjectStore::new());
        let uploader = ImageUploader::new(store.clone(), "screenshots", 1024);

        let err = edit(
            &session,
            &uploader,
            "missing",
            form().with_primary_file(png("a.png")),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ArchiveError::NotFound(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete() {
        let session = admin_session().await;
        let entry = create(
            &session,
            &memory_uploader(),
            form().with_primary_file(png("a.png")),
        )
        .await
        .unwrap();

        assert_eq!(delete(&session, &entry.id).await.unwrap(), entry);
        assert!(matches!(
            delete(&session, &entry.id).await,
            Err(ArchiveError::NotFound(_))
        ));
    }
}
