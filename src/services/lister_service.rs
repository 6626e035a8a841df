//! Object listing: the monitor's only view of the bucket.
//!
//! Listings are exposed as lazy streams of keys so that a bucket holding
//! millions of objects is walked page by page instead of being collected
//! up front.

use aws_config::SdkConfig;
use aws_sdk_s3::{Client, error::DisplayErrorContext};
use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("listing bucket `{bucket}` failed: {message}")]
    Store { bucket: String, message: String },
}

/// Anything that can enumerate every key in a bucket.
///
/// Keys come back in whatever order the store produces them. Implementations
/// must neither skip nor repeat keys across page boundaries.
pub trait ObjectLister: Send + Sync {
    fn list_keys<'a>(&'a self, bucket: &'a str) -> BoxStream<'a, Result<String, ListError>>;
}

/// Lists keys through the S3 ListObjectsV2 API, one page at a time.
#[derive(Clone, Debug)]
pub struct S3Lister {
    client: Client,
}

impl S3Lister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from shared AWS settings.
    ///
    /// With a custom `endpoint_url` the client switches to path-style
    /// addressing, which S3-compatible stores generally expect.
    pub fn from_sdk_config(shared: &SdkConfig, endpoint_url: Option<&str>) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(shared);
        if let Some(url) = endpoint_url {
            builder = builder.endpoint_url(url).force_path_style(true);
        }
        Self::new(Client::from_conf(builder.build()))
    }
}

impl ObjectLister for S3Lister {
    fn list_keys<'a>(&'a self, bucket: &'a str) -> BoxStream<'a, Result<String, ListError>> {
        let pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        stream::unfold(pages, |mut pages| async move {
            pages.next().await.map(|page| (page, pages))
        })
        .flat_map(move |page| {
            let keys: Vec<Result<String, ListError>> = match page {
                Ok(output) => {
                    debug!(bucket, keys = output.contents().len(), "listed page");
                    output
                        .contents()
                        .iter()
                        .filter_map(|object| object.key())
                        .map(|key| Ok(key.to_string()))
                        .collect()
                }
                Err(err) => vec![Err(ListError::Store {
                    bucket: bucket.to_string(),
                    message: DisplayErrorContext(&err).to_string(),
                })],
            };
            stream::iter(keys)
        })
        .boxed()
    }
}

/// A fixed set of keys held in memory.
#[derive(Clone, Debug, Default)]
pub struct StaticLister {
    keys: Vec<String>,
}

impl StaticLister {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// One key per line; blank lines are ignored.
    pub fn from_lines(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.trim().is_empty()),
        )
    }
}

impl ObjectLister for StaticLister {
    fn list_keys<'a>(&'a self, _bucket: &'a str) -> BoxStream<'a, Result<String, ListError>> {
        stream::iter(self.keys.iter().cloned().map(Ok)).boxed()
    }
}
