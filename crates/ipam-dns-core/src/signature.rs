//! Webhook signature verification
//!
//! The IPAM system signs each webhook body with HMAC-SHA512 using a shared
//! secret and sends the lowercase hex digest in the `X-Hook-Signature`
//! header.

use crate::error::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the body signature
pub const SIGNATURE_HEADER: &str = "X-Hook-Signature";

fn mac_for(secret: &[u8], body: &[u8]) -> Result<HmacSha512> {
    let mut mac = HmacSha512::new_from_slice(secret)
        .map_err(|e| Error::signature(format!("unusable secret: {}", e)))?;
    mac.update(body);
    Ok(mac)
}

/// Sign `body` with `secret`, returning the lowercase hex digest
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String> {
    Ok(hex::encode(mac_for(secret, body)?.finalize().into_bytes()))
}

/// Verify a hex signature over `body`
///
/// The comparison runs in constant time.
pub fn verify(secret: &[u8], signature: &str, body: &[u8]) -> Result<()> {
    let expected = hex::decode(signature.trim())
        .map_err(|e| Error::signature(format!("signature is not hex: {}", e)))?;

    mac_for(secret, body)?
        .verify_slice(&expected)
        .map_err(|_| Error::signature("digest mismatch"))
}
