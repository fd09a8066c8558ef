/// Part size used when a streamed upload has to switch to multipart (8 MiB).
pub const DEFAULT_PART_SIZE: usize = 8 * 1024 * 1024;

/// Smallest part size S3 accepts for every part but the last.
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Maximum number of keys a single `DeleteObjects` request may carry.
pub const DELETE_BATCH_SIZE: usize = 1000;

/// Read buffer size when streaming from a local reader.
pub(crate) const READ_CHUNK_SIZE: usize = 64 * 1024;
