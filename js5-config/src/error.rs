use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown opcode: {0}")]
    UnknownOpcode(u8),

    #[error("record stream ended without a terminating zero opcode")]
    MissingTerminator,

    #[error("decoding opcode {opcode} failed: {source}")]
    OpcodeDecode {
        opcode: u8,
        source: js5_parser::Error,
    },

    #[error("invalid repeat count: {0}")]
    InvalidCount(i64),

    #[error("invalid schema: {0}")]
    InvalidSchema(&'static str),

    #[error("index {index} out of range for field {field} of length {len}")]
    IndexOutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },

    #[error("record {id}: {source}")]
    Record {
        id: u32,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("store error: {0}")]
    Store(#[from] js5_store::StoreError),
}
