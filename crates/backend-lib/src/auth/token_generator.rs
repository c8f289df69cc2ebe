// ============================
// crates/backend-lib/src/auth/token_generator.rs
// ============================
//! Cryptographically secure session-token generation.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use scrypt::password_hash::rand_core::{OsRng, RngCore};

/// Default token size in bytes (32 bytes = 256 bits of entropy)
const DEFAULT_TOKEN_BYTES: usize = 32;

/// Generate an opaque session token from OS entropy, encoded as
/// URL-safe base64 without padding.
pub fn generate_session_token() -> String {
    generate_token_with_size(DEFAULT_TOKEN_BYTES)
}

/// Generate a random token with an explicit size in bytes.
pub fn generate_token_with_size(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
