//! OpenID Connect helpers

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha512};
use thiserror::Error;

/// OIDC error type
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OidcError {
    #[error("unhandled hash algorithm {0}")]
    UnsupportedAlgorithm(String),

    #[error("access token hash mismatch")]
    HashMismatch,
}

/// Verify an ID token's `at_hash` claim against the access token it came with.
///
/// See OIDC Core 1.0 sections 3.1.3.6 and 3.1.3.8: the claim is the
/// base64url encoding of the left half of the access token digest, using
/// the hash of the ID token's signing algorithm.
pub fn compare_access_token_hash(
    alg: &str,
    at_hash: &str,
    access_token: &str,
) -> Result<(), OidcError> {
    let expected = match alg {
        "ES512" => {
            let digest = Sha512::digest(access_token.as_bytes());
            URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
        }
        other => return Err(OidcError::UnsupportedAlgorithm(other.to_string())),
    };

    if expected != at_hash {
        return Err(OidcError::HashMismatch);
    }
    Ok(())
}
