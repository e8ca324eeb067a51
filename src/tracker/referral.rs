//! Referral code generation

use super::error::{Result, TrackerError};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a referral code
pub const CODE_LEN: usize = 8;

/// Generate a random 8-character code from `A-Z0-9`
pub fn generate_code() -> Result<String> {
    let mut bytes = [0u8; CODE_LEN];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| TrackerError::Internal(format!("random source unavailable: {e}")))?;
    // 252 = 7 * 36, reject above to avoid modulo bias
    let mut code = String::with_capacity(CODE_LEN);
    let mut pool = bytes.to_vec();
    while code.len() < CODE_LEN {
        let Some(b) = pool.pop() else {
            let mut more = [0u8; CODE_LEN];
            getrandom::getrandom(&mut more)
                .map_err(|e| TrackerError::Internal(format!("random source unavailable: {e}")))?;
            pool.extend_from_slice(&more);
            continue;
        };
        if b < 252 {
            code.push(ALPHABET[(b % 36) as usize] as char);
        }
    }
    Ok(code)
}

/// Whether `code` looks like a referral code we could have issued
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_well_formed() {
        for _ in 0..100 {
            let code = generate_code().unwrap();
            assert!(is_well_formed(&code), "bad code {code}");
        }
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("AB12CD34"));
        assert!(!is_well_formed("ab12cd34"));
        assert!(!is_well_formed("AB12"));
    }
}
