//! Random secrets embedded in share and invitation URLs.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Bytes of entropy per generated token.
pub const TOKEN_BYTES: usize = 32;

/// ## Summary
/// Generates a URL-safe token carrying [`TOKEN_BYTES`] bytes from the OS RNG.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
