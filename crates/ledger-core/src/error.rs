use thiserror::Error;

/// Failures reported by ledger operations. Signature checks are not in here:
/// `Transaction::is_valid` answers with a bool so chain scans never abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: i128 },

    #[error("not authorized: {0}")]
    Authorization(String),
}

#[derive(Debug, Clone, Error)]
pub enum CryptoError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid secret key: {0}")]
    SecretKey(String),

    #[error("invalid public key: {0}")]
    PublicKey(String),

    #[error("invalid signature: {0}")]
    Signature(String),

    #[error("signature does not match message and public key")]
    Verification,
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
