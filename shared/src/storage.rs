//! Object storage client factory.

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::Client as S3Client;

use crate::config::StorageConfig;

/// A configured S3 client, built once at startup and handed to whatever needs it.
#[derive(Clone, Debug)]
pub struct ObjectStorage {
    client: S3Client,
    region: String,
}

impl ObjectStorage {
    /// Build a client with static credentials for the configured region.
    pub fn from_config(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "talktodo-static",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
            region: config.region.clone(),
        }
    }

    pub fn client(&self) -> &S3Client {
        &self.client
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}
