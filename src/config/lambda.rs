#[cfg(feature = "lambda")]
use crate::domain::ports::{ObjectStore, StateStore};
#[cfg(feature = "lambda")]
use crate::utils::error::{EtlError, Result};
#[cfg(feature = "lambda")]
use aws_sdk_s3::operation::get_object::GetObjectError;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use std::env;

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub s3_bucket: String,
    pub s3_region: String,
    pub config_path: String,
    pub state_prefix: String,
}

#[cfg(feature = "lambda")]
impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            s3_bucket: env::var("S3_BUCKET").map_err(|_| EtlError::MissingConfigError {
                field: "S3_BUCKET".to_string(),
            })?,
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            config_path: env::var("CONFIG_PATH").unwrap_or_else(|_| "etl.toml".to_string()),
            state_prefix: env::var("STATE_PREFIX").unwrap_or_else(|_| "state".to_string()),
        })
    }
}

/// S3-backed object sink. Writes are full overwrites keyed by object path,
/// which is exactly the idempotence the ingestion jobs rely on when a page
/// is refetched.
#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

#[cfg(feature = "lambda")]
impl S3ObjectStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[cfg(feature = "lambda")]
impl ObjectStore for S3ObjectStore {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| EtlError::StorageError {
                path: path.to_string(),
                message: format!("failed to write to S3: {}", e),
            })?;
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| EtlError::StorageError {
                path: path.to_string(),
                message: format!("failed to read from S3: {}", e),
            })?;

        let data = resp.body.collect().await.map_err(|e| EtlError::StorageError {
            path: path.to_string(),
            message: format!("failed to collect S3 body: {}", e),
        })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let resp = request.send().await.map_err(|e| EtlError::StorageError {
                path: prefix.to_string(),
                message: format!("failed to list S3 objects: {}", e),
            })?;

            for object in resp.contents() {
                if let Some(key) = object.key() {
                    paths.push(key.to_string());
                }
            }

            match resp.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        paths.sort();
        Ok(paths)
    }
}

/// State documents as small JSON objects under a dedicated prefix in the
/// same bucket. A successful put is durable before it returns, which is the
/// guarantee the cursor protocol needs.
#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3StateStore {
    client: S3Client,
    bucket: String,
    prefix: String,
}

#[cfg(feature = "lambda")]
impl S3StateStore {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    fn document_key(&self, key: &str) -> String {
        format!("{}/{}.json", self.prefix.trim_end_matches('/'), key)
    }
}

#[cfg(feature = "lambda")]
impl StateStore for S3StateStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let document_key = self.document_key(key);
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&document_key)
            .send()
            .await;

        match resp {
            Ok(output) => {
                let data = output.body.collect().await.map_err(|e| EtlError::StateError {
                    key: key.to_string(),
                    message: format!("failed to collect state body: {}", e),
                })?;
                Ok(Some(serde_json::from_slice(&data.into_bytes())?))
            }
            Err(err) => match err.into_service_error() {
                // Absent cursor documents are a normal first-run state.
                GetObjectError::NoSuchKey(_) => Ok(None),
                other => Err(EtlError::StateError {
                    key: key.to_string(),
                    message: other.to_string(),
                }),
            },
        }
    }

    async fn set(&self, key: &str, document: serde_json::Value) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.document_key(key))
            .body(serde_json::to_vec(&document)?.into())
            .send()
            .await
            .map_err(|e| EtlError::StateError {
                key: key.to_string(),
                message: format!("failed to write state document: {}", e),
            })?;
        Ok(())
    }
}
