//! Entry encryption for at-rest key-value stores.
//!
//! ## Format
//! - Sealed blob: `b"CVS1"` (4 bytes) ‖ nonce (12 bytes) ‖ ciphertext + tag
//! - Algorithm: AES-256-GCM with a random nonce per write
//! - Lookup id: base64url(HMAC-SHA256(mac_key, namespace ‖ 0x00 ‖ key))
//!
//! Both subkeys are derived from the caller's [`MasterKey`] with
//! HMAC-SHA256 over fixed labels, so one master key serves every namespace.

use crate::base::storeerror::StoreError;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

type HmacSha256 = Hmac<Sha256>;

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const MAGIC: &[u8; 4] = b"CVS1";
const SEPARATOR: &[u8] = &[0];

const ENCRYPTION_LABEL: &[u8] = b"cookievault/v1/entry-encryption";
const KEY_ID_LABEL: &[u8] = b"cookievault/v1/entry-key-id";

/// 256-bit master key supplied by the host application.
///
/// Wiped from memory on drop. Storing the key (keychain, keystore, env) is
/// the caller's concern.
#[derive(Clone)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            StoreError::invalid_key(format!("expected {} bytes, got {}", KEY_LEN, bytes.len()))
        })?;
        Ok(Self(key))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, StoreError> {
        let bytes = Zeroizing::new(
            general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|_| StoreError::invalid_key("invalid base64"))?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(general_purpose::STANDARD.encode(self.0))
    }

    fn derive(&self, label: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, StoreError> {
        let mut out = Zeroizing::new([0_u8; KEY_LEN]);
        out.copy_from_slice(&hmac_sha256(&self.0, &[label])?);
        Ok(out)
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Seals and opens entry blobs, and derives their lookup ids.
pub struct EntryCipher {
    aead: Aes256Gcm,
    mac_key: Zeroizing<[u8; KEY_LEN]>,
}

impl EntryCipher {
    pub fn new(master: &MasterKey) -> Result<Self, StoreError> {
        let enc_key = master.derive(ENCRYPTION_LABEL)?;
        let aead = Aes256Gcm::new_from_slice(enc_key.as_slice())
            .map_err(|_| StoreError::invalid_key("invalid AES-256 key length"))?;
        Ok(Self {
            aead,
            mac_key: master.derive(KEY_ID_LABEL)?,
        })
    }

    /// Deterministic lookup id for `key` within `namespace`.
    pub fn key_id(&self, namespace: &str, key: &str) -> Result<String, StoreError> {
        let digest = hmac_sha256(
            self.mac_key.as_slice(),
            &[namespace.as_bytes(), SEPARATOR, key.as_bytes()],
        )?;
        Ok(general_purpose::URL_SAFE_NO_PAD.encode(digest))
    }

    pub fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, StoreError> {
        let mut nonce = [0_u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .aead
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| StoreError::Encryption)?;

        let mut output = Vec::with_capacity(MAGIC.len() + NONCE_LEN + ciphertext.len());
        output.extend_from_slice(MAGIC);
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    pub fn open(&self, sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>, StoreError> {
        if sealed.len() < MAGIC.len() + NONCE_LEN || &sealed[..MAGIC.len()] != MAGIC {
            return Err(StoreError::Decryption);
        }

        let nonce_end = MAGIC.len() + NONCE_LEN;
        let nonce = Nonce::from_slice(&sealed[MAGIC.len()..nonce_end]);

        self.aead
            .decrypt(
                nonce,
                Payload {
                    msg: &sealed[nonce_end..],
                    aad,
                },
            )
            .map_err(|_| StoreError::Decryption)
    }

    /// Convenience for UTF-8 payloads.
    pub fn open_string(&self, sealed: &[u8], aad: &[u8]) -> Result<String, StoreError> {
        String::from_utf8(self.open(sealed, aad)?).map_err(|_| StoreError::Decryption)
    }
}

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<[u8; KEY_LEN], StoreError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|_| StoreError::invalid_key("invalid HMAC key length"))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = [0_u8; KEY_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let cipher = EntryCipher::new(&MasterKey::generate()).unwrap();
        let sealed = cipher.seal(b"[{\"name\":\"sid\"}]", b"aad").unwrap();

        assert!(sealed.starts_with(MAGIC));
        assert_eq!(cipher.open(&sealed, b"aad").unwrap(), b"[{\"name\":\"sid\"}]");
    }

    #[test]
    fn test_nonce_is_random() {
        let cipher = EntryCipher::new(&MasterKey::generate()).unwrap();
        let a = cipher.seal(b"same", b"").unwrap();
        let b = cipher.seal(b"same", b"").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_aad_fails() {
        let cipher = EntryCipher::new(&MasterKey::generate()).unwrap();
        let sealed = cipher.seal(b"value", b"row-a").unwrap();
        assert_eq!(cipher.open(&sealed, b"row-b"), Err(StoreError::Decryption));
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = EntryCipher::new(&MasterKey::generate()).unwrap();
        let b = EntryCipher::new(&MasterKey::generate()).unwrap();
        let sealed = a.seal(b"value", b"").unwrap();
        assert_eq!(b.open(&sealed, b""), Err(StoreError::Decryption));
    }

    #[test]
    fn test_truncated_blob_fails() {
        let cipher = EntryCipher::new(&MasterKey::generate()).unwrap();
        assert_eq!(cipher.open(b"CVS1", b""), Err(StoreError::Decryption));
        assert_eq!(cipher.open(b"not-a-blob-at-all", b""), Err(StoreError::Decryption));
    }

    #[test]
    fn test_key_id_is_deterministic_per_namespace() {
        let cipher = EntryCipher::new(&MasterKey::generate()).unwrap();
        let a = cipher.key_id("jar", "https://example.com").unwrap();
        let b = cipher.key_id("jar", "https://example.com").unwrap();
        let c = cipher.key_id("other", "https://example.com").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.contains("example"));
    }

    #[test]
    fn test_master_key_base64_roundtrip() {
        let key = MasterKey::generate();
        let restored = MasterKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(key.0, restored.0);

        assert!(matches!(
            MasterKey::from_bytes(&[0_u8; 16]),
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            MasterKey::from_base64("***"),
            Err(StoreError::InvalidKey { .. })
        ));
    }
}
