//! `generate-key` command.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Random bytes per generated secret.
const KEY_BYTES: usize = 48;

/// Returns a random URL-safe secret suitable for `JWT_SECRET`.
#[must_use]
pub fn generate_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
