use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XTEA key must be exactly 4 words, got {0}")]
    InvalidKeyLength(usize),

    #[error("invalid key file: {0}")]
    InvalidKeyFile(#[from] serde_json::Error),

    #[error("invalid key entry on line {line}: {reason}")]
    InvalidKeyEntry { line: usize, reason: String },
}
