use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("read of {wanted} bytes at position {position} overruns buffer of {length} bytes")]
    OutOfBounds {
        position: usize,
        length: usize,
        wanted: usize,
    },

    #[error("unknown parameter type tag: {0}")]
    UnknownParamType(u8),

    #[error("variable-length integer exceeds 5 bytes")]
    VarIntTooLong,

    #[error("expected string version byte 0, got {0}")]
    InvalidStringVersion(u8),
}
