//! Storage sinks (GCS, S3, R2, Azure, local directories)

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Per-upload naming options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Object name; defaults to the local file name
    #[serde(default)]
    pub object_name: Option<String>,
    /// Extra path prefix inside the destination
    #[serde(default)]
    pub prefix: Option<String>,
}

impl UploadOptions {
    /// Options that keep the local file name
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload under `name` instead of the local file name
    #[must_use]
    pub fn object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = Some(name.into());
        self
    }

    /// Place the object under `prefix`
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Moves a finished local file to durable storage
///
/// Implementations own their retry behavior; callers treat any error as
/// final.
#[async_trait]
pub trait SinkUploader: Send + Sync {
    /// Upload `local_path` to `destination`, returning the stored location
    async fn upload(
        &self,
        local_path: &Path,
        destination: &str,
        options: &UploadOptions,
    ) -> Result<String>;
}

/// Parsed destination URL
struct Target {
    store: Arc<dyn ObjectStore>,
    scheme: &'static str,
    container: String,
    prefix: String,
}

/// [`SinkUploader`] backed by `object_store`
///
/// Destinations:
/// - `gs://bucket/path` - Google Cloud Storage
/// - `s3://bucket/path` - AWS S3
/// - `r2://bucket/path` - Cloudflare R2 (endpoint set with [`ObjectStoreSink::with_r2_endpoint`])
/// - `az://container/path` - Azure Blob Storage
/// - anything else - a local directory, created if missing
///
/// Cloud credentials come from each provider's standard environment.
#[derive(Clone, Default)]
pub struct ObjectStoreSink {
    store: Option<Arc<dyn ObjectStore>>,
    r2_endpoint: Option<String>,
}

impl ObjectStoreSink {
    /// Create a sink that picks a store per destination
    pub fn new() -> Self {
        Self::default()
    }

    /// Send every upload to `store`, keeping the destination's path as prefix
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store: Some(store),
            r2_endpoint: None,
        }
    }

    /// S3-compatible endpoint used for `r2://` destinations
    #[must_use]
    pub fn with_r2_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.r2_endpoint = Some(endpoint.into());
        self
    }

    fn target(&self, destination: &str) -> Result<Target> {
        let (scheme, rest) = match destination.split_once("://") {
            Some(("gs", rest)) => ("gs", rest),
            Some(("s3", rest)) => ("s3", rest),
            Some(("r2", rest)) => ("r2", rest),
            Some(("az", rest)) => ("az", rest),
            Some(("file", rest)) => ("file", rest),
            Some((other, _)) => {
                return Err(Error::sink(
                    destination,
                    format!("Unsupported destination scheme '{other}'"),
                ))
            }
            None => ("file", destination),
        };

        if scheme == "file" {
            let store = match self.store {
                Some(ref store) => store.clone(),
                None => local_store(destination, rest)?,
            };
            return Ok(Target {
                store,
                scheme,
                container: rest.trim_end_matches('/').to_string(),
                prefix: String::new(),
            });
        }

        let (container, prefix) = match rest.split_once('/') {
            Some((container, prefix)) => (container, prefix.trim_matches('/')),
            None => (rest, ""),
        };
        if container.is_empty() {
            return Err(Error::sink(destination, "Missing bucket name"));
        }

        let store = match self.store {
            Some(ref store) => store.clone(),
            None => cloud_store(destination, scheme, container, self.r2_endpoint.as_deref())?,
        };

        Ok(Target {
            store,
            scheme,
            container: container.to_string(),
            prefix: prefix.to_string(),
        })
    }
}

fn local_store(destination: &str, dir: &str) -> Result<Arc<dyn ObjectStore>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::sink(destination, format!("Failed to create directory: {e}")))?;
    let store = LocalFileSystem::new_with_prefix(dir)
        .map_err(|e| Error::sink(destination, format!("Failed to open directory: {e}")))?;
    Ok(Arc::new(store))
}

fn cloud_store(
    destination: &str,
    scheme: &str,
    container: &str,
    r2_endpoint: Option<&str>,
) -> Result<Arc<dyn ObjectStore>> {
    let built: object_store::Result<Arc<dyn ObjectStore>> = match scheme {
        "gs" => GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(container)
            .build()
            .map(|s| Arc::new(s) as Arc<dyn ObjectStore>),
        "az" => MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map(|s| Arc::new(s) as Arc<dyn ObjectStore>),
        _ => {
            let mut builder = AmazonS3Builder::from_env().with_bucket_name(container);
            if scheme == "r2" {
                let endpoint = r2_endpoint.ok_or_else(|| {
                    Error::sink(destination, "R2 destinations need an endpoint URL")
                })?;
                builder = builder.with_endpoint(endpoint);
            }
            builder.build().map(|s| Arc::new(s) as Arc<dyn ObjectStore>)
        }
    };

    built.map_err(|e| Error::sink(destination, format!("Failed to create {scheme} client: {e}")))
}

/// Object key for an upload: `{destination prefix}/{option prefix}/{name}`
fn object_key(local_path: &Path, target_prefix: &str, options: &UploadOptions) -> Result<String> {
    let name = match options.object_name {
        Some(ref name) => name.clone(),
        None => local_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| {
                Error::sink(
                    local_path.display().to_string(),
                    "Local path has no file name",
                )
            })?,
    };

    let parts: Vec<&str> = [target_prefix, options.prefix.as_deref().unwrap_or_default()]
        .into_iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .chain(std::iter::once(name.trim_start_matches('/')))
        .collect();

    Ok(parts.join("/"))
}

#[async_trait]
impl SinkUploader for ObjectStoreSink {
    async fn upload(
        &self,
        local_path: &Path,
        destination: &str,
        options: &UploadOptions,
    ) -> Result<String> {
        let target = self.target(destination)?;
        let key = object_key(local_path, &target.prefix, options)?;

        let data = tokio::fs::read(local_path).await.map_err(|e| {
            Error::sink(
                destination,
                format!("Failed to read {}: {e}", local_path.display()),
            )
        })?;
        let size = data.len();

        let location = ObjectPath::from(key.as_str());
        target
            .store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await
            .map_err(|e| Error::sink(destination, format!("Failed to write {location}: {e}")))?;

        let stored = if target.scheme == "file" {
            format!("{}/{location}", target.container)
        } else {
            format!("{}://{}/{location}", target.scheme, target.container)
        };
        info!(bytes = size, "Uploaded to {stored}");
        Ok(stored)
    }
}

impl fmt::Debug for ObjectStoreSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreSink")
            .field("fixed_store", &self.store.is_some())
            .field("r2_endpoint", &self.r2_endpoint)
            .finish()
    }
}
