use es_domain::error::DomainError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("validation: {0}")]
    Validation(String),

    #[error("example not found: {0}")]
    NotFound(String),

    #[error("application closed")]
    Closed,
}

impl AppError {
    /// 是否为乐观并发冲突
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, AppError::Domain(err) if err.is_concurrency_conflict())
    }
}
