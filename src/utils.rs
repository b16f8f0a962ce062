use sha1::{Digest, Sha1};

/// Derive a node address from a secret.
///
/// The address is the lowercase hex of the secret's SHA-1 digest, so the
/// same secret always yields the same address.
pub fn address_for_secret(secret: &str) -> String {
    hex::encode(Sha1::digest(secret.as_bytes()))
}
