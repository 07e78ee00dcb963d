use thiserror::Error;

/// Errors are fatal: the tool deletes objects, so it fails fast rather
/// than continuing on a partial view of the bucket.
#[derive(Debug, Error)]
pub enum ExpireError {
    #[error("{0}")]
    Configuration(String),

    #[error(
        "Unable to open requested S3 bucket - does not exist or insufficient permissions [{bucket}]"
    )]
    BucketUnavailable {
        bucket: String,
        #[source]
        source: aws_sdk_s3::Error,
    },

    #[error("S3 request failed: {0}")]
    Storage(#[from] aws_sdk_s3::Error),
}

impl ExpireError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn bucket_unavailable(bucket: impl Into<String>, source: aws_sdk_s3::Error) -> Self {
        Self::BucketUnavailable {
            bucket: bucket.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpireError>;
