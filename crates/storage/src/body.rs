//! Helpers for building and consuming [`ObjectBody`] streams.
//!
//! Bodies are never buffered whole by the gateway; these helpers keep that property.

use crate::constants::READ_CHUNK_SIZE;
use crate::{ObjectBody, StorageError, StorageResult};
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

/// A body yielding `data` as a single chunk.
pub fn from_bytes(data: impl Into<Bytes>) -> ObjectBody {
    let data = data.into();
    futures::stream::once(async move { Ok(data) }).boxed()
}

/// A body with no content (directory placeholders).
pub fn empty() -> ObjectBody {
    futures::stream::empty().boxed()
}

/// Streams `reader` in fixed-size chunks. `origin` names the source in error messages.
pub fn from_reader<R>(reader: R, origin: impl Into<String>) -> ObjectBody
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let origin = origin.into();
    futures::stream::try_unfold((reader, origin), |(mut reader, origin)| async move {
        let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);
        let read = reader
            .read_buf(&mut buf)
            .await
            .map_err(|e| StorageError::InvalidBody {
                origin: origin.clone(),
                source: e.into(),
            })?;
        if read == 0 {
            Ok(None)
        } else {
            Ok(Some((buf.freeze(), (reader, origin))))
        }
    })
    .boxed()
}

/// Fails the body with [`StorageError::SizeLimitExceeded`] once more than `limit` bytes
/// have passed through it.
pub fn limited(body: ObjectBody, key: impl Into<String>, limit: u64) -> ObjectBody {
    let key = key.into();
    body.scan(0u64, move |seen, chunk| {
        let item = chunk.and_then(|chunk| {
            *seen = seen.saturating_add(chunk.len() as u64);
            if *seen > limit {
                Err(StorageError::SizeLimitExceeded {
                    key: key.clone(),
                    limit,
                })
            } else {
                Ok(chunk)
            }
        });
        futures::future::ready(Some(item))
    })
    .boxed()
}

/// Reads a whole body into memory. Only meant for small objects and tests.
pub async fn read_to_bytes(body: ObjectBody) -> StorageResult<Bytes> {
    let chunks: Vec<Bytes> = body.try_collect().await?;
    let mut buf = BytesMut::new();
    for chunk in chunks {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}
