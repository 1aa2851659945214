//! Password hashing with bcrypt

use anyhow::Context;

use crate::error::ApiError;

pub fn hash(password: &str) -> Result<String, ApiError> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST).context("password hashing failed")?)
}

pub fn verify(password: &str, hash: &str) -> Result<bool, ApiError> {
    Ok(bcrypt::verify(password, hash).context("password verification failed")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let h = hash("hunter22").unwrap();
        assert!(verify("hunter22", &h).unwrap());
        assert!(!verify("hunter23", &h).unwrap());
    }

    #[test]
    fn test_bad_stored_hash_is_error() {
        assert!(verify("pw", "not-a-bcrypt-hash").is_err());
    }
}
