//! Shared-secret keys for the JSON API

use std::fmt::Write;

use anyhow::{Context, Result};

/// Prefix that makes a key recognisable in configs and logs
pub const API_TOKEN_PREFIX: &str = "shk_";

const TOKEN_BYTES: usize = 24;

/// Generate a key for `server.auth_token`, sent by clients as `X-SlerfHub-Token`.
///
/// Fails if the OS random source is unavailable.
pub fn generate_api_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::getrandom(&mut bytes).context("OS random source unavailable")?;

    let mut token = String::with_capacity(API_TOKEN_PREFIX.len() + TOKEN_BYTES * 2);
    token.push_str(API_TOKEN_PREFIX);
    for b in bytes {
        let _ = write!(token, "{b:02x}");
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_api_token().unwrap();
        let hex = token.strip_prefix(API_TOKEN_PREFIX).unwrap();
        assert_eq!(hex.len(), 48);
        assert!(hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        assert_ne!(token, generate_api_token().unwrap());
    }
}
