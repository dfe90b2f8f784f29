//! 载荷加解密（Cipher）
//!
//! 对序列化后的载荷字节做对称、带完整性校验的加解密。
//! 默认实现 `XChaChaCipher`：XChaCha20-Poly1305，随机 24 字节 nonce 前置于密文。
//!
use crate::error::{DomainError, DomainResult as Result};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use std::fmt;
use std::sync::Arc;

const NONCE_LEN: usize = 24;

pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

impl<T> Cipher for Arc<T>
where
    T: Cipher + ?Sized,
{
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        (**self).encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        (**self).decrypt(ciphertext)
    }
}

#[derive(Clone)]
pub struct XChaChaCipher {
    aead: XChaCha20Poly1305,
}

impl XChaChaCipher {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            aead: XChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// 生成随机 256 位密钥
    pub fn generate_key() -> [u8; 32] {
        let generated = XChaCha20Poly1305::generate_key(&mut OsRng);
        let mut key = [0u8; 32];
        key.copy_from_slice(&generated);
        key
    }
}

impl fmt::Debug for XChaChaCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("XChaChaCipher(..)")
    }
}

impl Cipher for XChaChaCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|_| DomainError::cipher("encryption failed"))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            return Err(DomainError::cipher(format!(
                "ciphertext too short: {} bytes",
                ciphertext.len()
            )));
        }
        let (nonce, body) = ciphertext.split_at(NONCE_LEN);
        self.aead
            .decrypt(XNonce::from_slice(nonce), body)
            .map_err(|_| DomainError::cipher("decryption failed"))
    }
}
