// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Field Cipher
//!
//! Symmetric encryption of individual report fields.
//!
//! Each call to [`FieldCipher::encrypt`] produces a self-contained
//! *ciphertext package*:
//!
//! ```text
//! base64(nonce) ":" base64(ciphertext || tag)
//! ```
//!
//! ## Security
//!
//! - AES-256-GCM (`ring`), 256-bit key derived from `AES_SECRET`
//! - A fresh random nonce is drawn for every single encryption; two packages
//!   for the same plaintext never share a nonce
//! - The key is built once at startup and never re-read per call
//! - Decryption failures never propagate: bulk readers get `""` and move on

use base64ct::{Base64, Encoding};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};

/// Required key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Byte used to right-pad secrets shorter than [`KEY_LEN`].
const KEY_PAD: u8 = b'0';

/// Separator between the nonce and the ciphertext inside a package.
const PACKAGE_DELIMITER: char = ':';

/// Known plaintext used by [`FieldCipher::self_test`].
const SELF_TEST_PLAINTEXT: &str = "Test encryption";

/// Errors raised by the field cipher.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// No secret was configured.
    #[error("encryption secret is not configured")]
    MissingSecret,

    /// The key could not be constructed from the secret.
    #[error("invalid encryption key")]
    InvalidKey,

    /// The system random source failed.
    #[error("random nonce generation failed")]
    Rng,

    /// Sealing the plaintext failed.
    #[error("encryption failed")]
    Seal,

    /// The package is not `nonce:ciphertext`.
    #[error("malformed ciphertext package")]
    MalformedPackage,

    /// Authentication failed (wrong key or tampered package).
    #[error("decryption failed")]
    Open,

    /// Decrypted bytes are not UTF-8.
    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

/// Derive the fixed-size key from a configured secret.
///
/// Secrets longer than 32 bytes are truncated, shorter ones are right-padded
/// with `'0'`. An empty secret is a configuration error.
pub fn derive_key(secret: &str) -> Result<[u8; KEY_LEN], CipherError> {
    if secret.is_empty() {
        return Err(CipherError::MissingSecret);
    }

    let mut key = [KEY_PAD; KEY_LEN];
    let bytes = secret.as_bytes();
    let len = bytes.len().min(KEY_LEN);
    key[..len].copy_from_slice(&bytes[..len]);
    Ok(key)
}

/// Where per-call nonces come from.
pub trait NonceSource: Send + Sync {
    /// Fill `nonce` with fresh, unpredictable bytes.
    fn fill_nonce(&self, nonce: &mut [u8; NONCE_LEN]) -> Result<(), CipherError>;
}

impl NonceSource for SystemRandom {
    fn fill_nonce(&self, nonce: &mut [u8; NONCE_LEN]) -> Result<(), CipherError> {
        self.fill(nonce).map_err(|_| CipherError::Rng)
    }
}

/// Field-level cipher shared by the whole process.
pub struct FieldCipher {
    key: LessSafeKey,
    nonces: Box<dyn NonceSource>,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// Build a cipher from the configured secret.
    pub fn new(secret: &str) -> Result<Self, CipherError> {
        Self::with_nonce_source(secret, SystemRandom::new())
    }

    /// Build a cipher drawing nonces from `nonces` instead of the system RNG.
    pub fn with_nonce_source(
        secret: &str,
        nonces: impl NonceSource + 'static,
    ) -> Result<Self, CipherError> {
        let key_bytes = derive_key(secret)?;
        let unbound =
            UnboundKey::new(&AES_256_GCM, &key_bytes).map_err(|_| CipherError::InvalidKey)?;

        Ok(Self {
            key: LessSafeKey::new(unbound),
            nonces: Box::new(nonces),
        })
    }

    /// Encrypt a single field value.
    ///
    /// Empty and whitespace-only input yields the empty sentinel `""`
    /// without touching the cipher.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.trim().is_empty() {
            return Ok(String::new());
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.nonces.fill_nonce(&mut nonce_bytes)?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CipherError::Seal)?;

        Ok(format!(
            "{}{PACKAGE_DELIMITER}{}",
            Base64::encode_string(&nonce_bytes),
            Base64::encode_string(&in_out)
        ))
    }

    /// Decrypt a package, reporting why it failed.
    ///
    /// The empty sentinel decrypts to `""`.
    pub fn try_decrypt(&self, package: &str) -> Result<String, CipherError> {
        if package.is_empty() {
            return Ok(String::new());
        }

        let (nonce_part, body_part) = package
            .split_once(PACKAGE_DELIMITER)
            .ok_or(CipherError::MalformedPackage)?;

        let nonce_vec =
            Base64::decode_vec(nonce_part).map_err(|_| CipherError::MalformedPackage)?;
        let nonce_bytes: [u8; NONCE_LEN] = nonce_vec
            .try_into()
            .map_err(|_| CipherError::MalformedPackage)?;
        let mut in_out =
            Base64::decode_vec(body_part).map_err(|_| CipherError::MalformedPackage)?;

        let plaintext = self
            .key
            .open_in_place(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CipherError::Open)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| CipherError::InvalidUtf8)
    }

    /// Decrypt a package, degrading to `""` on any failure.
    pub fn decrypt(&self, package: &str) -> String {
        match self.try_decrypt(package) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::warn!(error = %e, "Field decryption failed");
                String::new()
            }
        }
    }

    /// Encrypt a known string and check it decrypts back exactly.
    ///
    /// Run before every encrypting write; a failure aborts the write.
    pub fn self_test(&self) -> bool {
        match self.encrypt(SELF_TEST_PLAINTEXT) {
            Ok(package) if !package.is_empty() => {
                self.try_decrypt(&package).ok().as_deref() == Some(SELF_TEST_PLAINTEXT)
            }
            Ok(_) => false,
            Err(e) => {
                tracing::error!(error = %e, "Cipher self-test failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::new("a9f3b1c7d5e2f8a0c4b6d7e9f1a2b3c4").unwrap()
    }

    struct NoEntropy;

    impl NonceSource for NoEntropy {
        fn fill_nonce(&self, _nonce: &mut [u8; NONCE_LEN]) -> Result<(), CipherError> {
            Err(CipherError::Rng)
        }
    }

    #[test]
    fn rng_failure_fails_encrypt_and_self_test() {
        let cipher = FieldCipher::with_nonce_source("a9f3b1c7d5e2f8a0c4b6d7e9f1a2b3c4", NoEntropy)
            .unwrap();
        assert!(matches!(cipher.encrypt("Illegal Dumping"), Err(CipherError::Rng)));
        assert_eq!(cipher.encrypt("  ").unwrap(), "");
        assert!(!cipher.self_test());
    }

    #[test]
    fn round_trips_plaintext() {
        let cipher = cipher();
        for text in ["Illegal Dumping", "City Park", "नेपाल", "a:b:c", " padded "] {
            let package = cipher.encrypt(text).unwrap();
            assert_eq!(cipher.decrypt(&package), text);
        }
    }

    #[test]
    fn empty_input_is_sentinel() {
        let cipher = cipher();
        assert_eq!(cipher.encrypt("").unwrap(), "");
        assert_eq!(cipher.encrypt("   \t").unwrap(), "");
        assert_eq!(cipher.decrypt(""), "");
    }

    #[test]
    fn same_plaintext_gets_fresh_nonce() {
        let cipher = cipher();
        let first = cipher.encrypt("same text").unwrap();
        let second = cipher.encrypt("same text").unwrap();
        assert_ne!(first, second);

        let nonce_a = first.split(':').next().unwrap();
        let nonce_b = second.split(':').next().unwrap();
        assert_ne!(nonce_a, nonce_b);
    }

    #[test]
    fn garbage_decrypts_to_empty() {
        let cipher = cipher();
        assert_eq!(cipher.decrypt("not a package"), "");
        assert_eq!(cipher.decrypt("abc:def"), "");
        assert_eq!(cipher.decrypt(":"), "");
        assert!(matches!(
            cipher.try_decrypt("no-delimiter"),
            Err(CipherError::MalformedPackage)
        ));
    }

    #[test]
    fn tampered_package_fails_authentication() {
        let cipher = cipher();
        let package = cipher.encrypt("evidence").unwrap();
        let (nonce, body) = package.split_once(':').unwrap();
        let mut bytes = Base64::decode_vec(body).unwrap();
        bytes[0] ^= 0xff;
        let tampered = format!("{nonce}:{}", Base64::encode_string(&bytes));

        assert!(matches!(cipher.try_decrypt(&tampered), Err(CipherError::Open)));
        assert_eq!(cipher.decrypt(&tampered), "");
    }

    #[test]
    fn wrong_key_decrypts_to_empty() {
        let package = cipher().encrypt("secret location").unwrap();
        let other = FieldCipher::new("another-secret").unwrap();
        assert_eq!(other.decrypt(&package), "");
    }

    #[test]
    fn short_secret_is_padded_and_long_truncated() {
        let short = derive_key("abc").unwrap();
        assert_eq!(&short[..3], b"abc");
        assert!(short[3..].iter().all(|b| *b == b'0'));

        let long = derive_key(&"x".repeat(40)).unwrap();
        assert_eq!(long, [b'x'; KEY_LEN]);

        // Truncation means both secrets share a key.
        let a = FieldCipher::new(&format!("{}{}", "k".repeat(32), "tail-one")).unwrap();
        let b = FieldCipher::new(&format!("{}{}", "k".repeat(32), "tail-two")).unwrap();
        let package = a.encrypt("shared").unwrap();
        assert_eq!(b.decrypt(&package), "shared");
    }

    #[test]
    fn missing_secret_is_rejected() {
        assert!(matches!(FieldCipher::new(""), Err(CipherError::MissingSecret)));
    }

    #[test]
    fn self_test_passes() {
        assert!(cipher().self_test());
    }
}
