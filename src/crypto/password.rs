use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::CryptoError;

#[cfg(not(test))]
pub const PBKDF2_ITERATIONS: u32 = 600_000;
#[cfg(test)]
pub const PBKDF2_ITERATIONS: u32 = 1_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password hash: zeroed on drop
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct PasswordHash {
    hash_bytes: [u8; HASH_LENGTH],
    salt: [u8; SALT_LENGTH],
}

impl PasswordHash {
    /// Hash a new password with a fresh random salt.
    pub fn create(password: &str) -> Result<Self, CryptoError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CryptoError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        let salt = generate_salt();
        Ok(Self::derive(password, &salt))
    }

    /// Derive from password + salt using PBKDF2-SHA256
    pub fn derive(password: &str, salt: &[u8; SALT_LENGTH]) -> Self {
        let mut hash_bytes = [0u8; HASH_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut hash_bytes);
        Self {
            hash_bytes,
            salt: *salt,
        }
    }

    pub fn hash_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.hash_bytes
    }

    pub fn salt(&self) -> &[u8; SALT_LENGTH] {
        &self.salt
    }
}

/// Check a candidate password against stored hash + salt in constant time.
pub fn verify_password(
    password: &str,
    stored_hash: &[u8],
    stored_salt: &[u8],
) -> Result<(), CryptoError> {
    let salt: [u8; SALT_LENGTH] = stored_salt
        .try_into()
        .map_err(|_| CryptoError::CorruptedCredentials)?;
    if stored_hash.len() != HASH_LENGTH {
        return Err(CryptoError::CorruptedCredentials);
    }

    let candidate = PasswordHash::derive(password, &salt);
    if bool::from(candidate.hash_bytes()[..].ct_eq(stored_hash)) {
        Ok(())
    } else {
        Err(CryptoError::WrongPassword)
    }
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_produces_deterministic_hash() {
        let salt = [42u8; SALT_LENGTH];
        let h1 = PasswordHash::derive("password", &salt);
        let h2 = PasswordHash::derive("password", &salt);
        assert_eq!(h1.hash_bytes(), h2.hash_bytes());
    }

    #[test]
    fn different_salts_produce_different_hashes() {
        let h1 = PasswordHash::derive("password", &[1u8; SALT_LENGTH]);
        let h2 = PasswordHash::derive("password", &[2u8; SALT_LENGTH]);
        assert_ne!(h1.hash_bytes(), h2.hash_bytes());
    }

    #[test]
    fn verify_accepts_correct_password() {
        let hash = PasswordHash::create("correct horse").unwrap();
        assert!(verify_password("correct horse", hash.hash_bytes(), hash.salt()).is_ok());
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = PasswordHash::create("correct horse").unwrap();
        let err = verify_password("battery staple", hash.hash_bytes(), hash.salt()).unwrap_err();
        assert!(matches!(err, CryptoError::WrongPassword));
    }

    #[test]
    fn verify_rejects_truncated_salt() {
        let hash = PasswordHash::create("correct horse").unwrap();
        let err = verify_password("correct horse", hash.hash_bytes(), &[0u8; 4]).unwrap_err();
        assert!(matches!(err, CryptoError::CorruptedCredentials));
    }

    #[test]
    fn short_password_rejected() {
        let err = PasswordHash::create("short").err().unwrap();
        assert!(matches!(err, CryptoError::PasswordTooShort { min: 8 }));
    }

    #[test]
    fn generate_salt_is_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
