// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Slice step cannot be zero")]
    ZeroSliceStep,

    #[error("Invalid type tag {0:?}: must be non-empty without whitespace or '#'")]
    InvalidTypeTag(String),

    #[error("Invalid permutation of length {0}")]
    InvalidPermutation(usize),
}

pub type Result<T> = std::result::Result<T, DomainError>;
