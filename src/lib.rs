//! media-archive: a small curated catalog of videos with screenshots
//!
//! Anyone can browse and search the catalog. One configured admin can add,
//! edit and delete entries; screenshots are uploaded to object storage and
//! referenced by public URL.
//!
//! Provides:
//! - `catalog`: entries, drafts and the in-memory store
//! - `upload`: object storage boundary and the screenshot uploader
//! - `auth`: identity providers and the admin gate
//! - `session`: per-browser catalog and auth state
//! - `submit`: the admin add/edit/delete path
//! - `api`: axum HTTP surface

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod session;
pub mod submit;
pub mod upload;

pub use api::{create_router, AppState};
pub use catalog::{CatalogStore, VideoDraft, VideoEntry};
pub use config::Config;
pub use error::{ArchiveError, Result};

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use auth::{AdminPolicy, HttpIdentityProvider, IdentityProvider, LocalIdentityProvider};
use config::{AuthProviderKind, StorageBackend};
use session::SessionRegistry;
use upload::{HttpObjectStore, ImageUploader, MemoryObjectStore, ObjectStore};

/// Wire up providers, storage and the session registry from config
pub fn build_state(config: &Config) -> Result<AppState> {
    let seed = CatalogStore::from_seed(config.catalog.seed.clone())?;

    let mut memory_store = None;
    let store: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::Remote => {
            let base_url = required(&config.storage.base_url, "storage.base_url")?;
            let api_key = required(&config.storage.api_key, "storage.api_key")?;
            Arc::new(HttpObjectStore::new(
                base_url,
                api_key,
                Duration::from_secs(config.storage.timeout_secs),
            )?)
        }
        StorageBackend::Memory => {
            let store = Arc::new(
                MemoryObjectStore::new()
                    .with_public_base(&config.server.public_base_url())
                    .with_capacity(config.storage.memory_capacity_bytes),
            );
            memory_store = Some(store.clone());
            store
        }
    };
    info!(backend = ?config.storage.backend, bucket = %config.storage.bucket, "Object storage ready");

    let provider: Arc<dyn IdentityProvider> = match config.auth.provider {
        AuthProviderKind::Remote => {
            let base_url = required(&config.auth.base_url, "auth.base_url")?;
            Arc::new(HttpIdentityProvider::new(
                base_url,
                config.auth.api_key.clone(),
                Duration::from_secs(config.auth.timeout_secs),
            )?)
        }
        AuthProviderKind::Local => Arc::new(LocalIdentityProvider::new(config.auth.users.clone())),
    };
    info!(provider = ?config.auth.provider, "Identity provider ready");

    let registry = SessionRegistry::new(
        seed,
        AdminPolicy::new(&config.auth.admin_email),
        Duration::from_secs(config.session.idle_ttl_secs),
    );

    Ok(AppState {
        registry: Arc::new(registry),
        uploader: ImageUploader::new(
            store,
            config.storage.bucket.clone(),
            config.storage.max_image_bytes,
        ),
        provider,
        memory_store,
    })
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| ArchiveError::Config(format!("{} is required", field)))
}
