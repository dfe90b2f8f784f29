//! 应用配置
//!
use crate::error::AppError;
use bon::Builder;
use es_domain::error::DomainError;
use es_domain::persist::{DEFAULT_PAGE_SIZE, SnapshotPolicy, StoreConfig};
use std::fmt;

#[derive(Clone, Builder)]
pub struct AppConfig {
    /// 三个存储均加密载荷；需要 `cipher_key`
    #[builder(default)]
    always_encrypt: bool,
    /// XChaCha20-Poly1305 密钥
    cipher_key: Option<[u8; 32]>,
    #[builder(default = DEFAULT_PAGE_SIZE)]
    page_size: usize,
    #[builder(default)]
    snapshot_policy: SnapshotPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AppConfig {
    pub fn always_encrypt(&self) -> bool {
        self.always_encrypt
    }

    pub fn cipher_key(&self) -> Option<&[u8; 32]> {
        self.cipher_key.as_ref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        self.snapshot_policy
    }

    /// 构建应用前校验：快照间隔、页大小与加密密钥
    pub fn validate(&self) -> Result<(), AppError> {
        self.snapshot_policy.validate()?;
        if self.page_size == 0 {
            return Err(DomainError::InvalidConfig {
                reason: "page_size must be >= 1".into(),
            }
            .into());
        }
        if self.always_encrypt && self.cipher_key.is_none() {
            return Err(DomainError::InvalidConfig {
                reason: "always_encrypt requires cipher_key".into(),
            }
            .into());
        }
        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::builder()
            .always_encrypt(self.always_encrypt)
            .page_size(self.page_size)
            .build()
    }
}

// 不输出密钥
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("always_encrypt", &self.always_encrypt)
            .field("cipher_key", &self.cipher_key.map(|_| "<redacted>"))
            .field("page_size", &self.page_size)
            .field("snapshot_policy", &self.snapshot_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_redaction() {
        let config = AppConfig::default();
        assert!(!config.always_encrypt());
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(config.snapshot_policy(), SnapshotPolicy::Never);

        let keyed = AppConfig::builder()
            .always_encrypt(true)
            .cipher_key([7u8; 32])
            .build();
        let printed = format!("{keyed:?}");
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("7, 7"));
        assert!(keyed.store_config().always_encrypt);
        assert!(keyed.validate().is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let invalid = [
            AppConfig::builder()
                .snapshot_policy(SnapshotPolicy::Every(0))
                .build(),
            AppConfig::builder().page_size(0).build(),
            AppConfig::builder().always_encrypt(true).build(),
        ];
        for config in invalid {
            assert!(matches!(
                config.validate(),
                Err(AppError::Domain(DomainError::InvalidConfig { .. }))
            ));
        }
        assert!(AppConfig::default().validate().is_ok());
    }
}
