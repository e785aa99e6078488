//! Access keys, secrets and app tokens.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

const ACCESS_KEY_PREFIX: &str = "SWIA";
const ACCESS_KEY_BODY_LEN: usize = 26;

/// Integration access key: `SWIA` plus 26 uppercase alphanumerics.
pub fn generate_access_key() -> String {
    let body: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(ACCESS_KEY_BODY_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{ACCESS_KEY_PREFIX}{body}")
}

/// 32 random bytes, hex encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Token the app uses to authenticate against the platform.
pub fn generate_access_token() -> String {
    generate_secret()
}
