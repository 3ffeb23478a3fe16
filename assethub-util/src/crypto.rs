use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::{Digest as _, Sha256};

pub const ALPHA_NUM: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn sha256_hex_digest<D: AsRef<[u8]>>(data: D) -> String {
    let mut hasher = Sha256::default();
    hasher.update(data.as_ref());
    let digest = hasher.finalize();
    format!("{digest:x}")
}

/// Sign `data` with HMAC-SHA256 and return the base64 encoded digest
pub fn hmac_sha256_base64<D: AsRef<[u8]>>(key: &[u8], data: D) -> String {
    // HMAC accepts keys of any length, this cannot fail
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("hmac keys can have any size"));
    mac.update(data.as_ref());
    STANDARD.encode(mac.finalize().into_bytes())
}

pub fn pseudorandom_string(charset: &[u8], len: usize) -> String {
    let mut rng = fastrand::Rng::new();
    std::iter::repeat_with(|| charset[rng.usize(..charset.len())] as char)
        .take(len)
        .collect()
}
