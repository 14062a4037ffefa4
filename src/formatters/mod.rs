pub mod buckets;
pub mod json_compact;
pub mod tree;

pub use buckets::{Bucket, BucketFormatter, DEFAULT_ADAPTER_PATTERN};
pub use json_compact::JsonCompactFormatter;
pub use tree::TreeFormatter;
