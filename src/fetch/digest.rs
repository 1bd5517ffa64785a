//! Body digests used to confirm a cached file matches the fetched one.

use md5::{Digest, Md5};

/// MD5 of `data` as lowercase hex.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
