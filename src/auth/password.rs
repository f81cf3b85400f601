use std::str::FromStr;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::error;

/// How new credentials are hashed.
///
/// `Sha256` is an unsalted digest and is kept as the default because existing
/// rows were written that way. `Argon2` is opt-in via `PASSWORD_SCHEME=argon2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PasswordScheme {
    #[default]
    Sha256,
    Argon2,
}

impl FromStr for PasswordScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "argon2" => Ok(Self::Argon2),
            other => anyhow::bail!("unknown password scheme: {other}"),
        }
    }
}

pub fn hash_password(scheme: PasswordScheme, plain: &str) -> anyhow::Result<String> {
    match scheme {
        PasswordScheme::Sha256 => Ok(sha256_hex(plain)),
        PasswordScheme::Argon2 => {
            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(plain.as_bytes(), &salt)
                .map_err(|e| {
                    error!(error = %e, "argon2 hash_password error");
                    anyhow::anyhow!(e.to_string())
                })?
                .to_string();
            Ok(hash)
        }
    }
}

/// Checks `plain` against a stored hash of either scheme.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    if stored.starts_with("$argon2") {
        let parsed = PasswordHash::new(stored).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        return Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok());
    }

    if stored.len() != 64 || !stored.bytes().all(|b| b.is_ascii_hexdigit()) {
        anyhow::bail!("stored password hash has an unrecognised format");
    }
    Ok(sha256_hex(plain).eq_ignore_ascii_case(stored))
}

fn sha256_hex(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic() {
        let a = hash_password(PasswordScheme::Sha256, "secret1").unwrap();
        let b = hash_password(PasswordScheme::Sha256, "secret1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, "secret1");
    }

    #[test]
    fn sha256_verify_roundtrip() {
        let hash = hash_password(PasswordScheme::Sha256, "secret1").unwrap();
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("secret2", &hash).unwrap());
    }

    #[test]
    fn argon2_hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(PasswordScheme::Argon2, password).expect("hashing should succeed");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(password, &hash).expect("verify should succeed"));
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn scheme_parses_from_config_values() {
        assert_eq!("sha256".parse::<PasswordScheme>().unwrap(), PasswordScheme::Sha256);
        assert_eq!(" Argon2 ".parse::<PasswordScheme>().unwrap(), PasswordScheme::Argon2);
        assert!("bcrypt".parse::<PasswordScheme>().is_err());
    }
}
