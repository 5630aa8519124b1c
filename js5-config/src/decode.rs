//! The generic opcode decode loop.

use js5_parser::Reader;
use tracing::trace;

use crate::instr::{Instr, Schema, Slot};
use crate::record::Record;
use crate::{ConfigError, Result};

/// Decode one record from its byte stream.
///
/// Opcodes are read until a zero terminator; each selects its coder list
/// from the schema. An opcode absent from the schema, or a stream that ends
/// before the terminator, is a decode error.
pub fn decode_record(schema: &Schema, data: &[u8]) -> Result<Record> {
    let mut reader = Reader::new(data);
    let mut record = Record::with_defaults(schema);
    loop {
        let opcode = reader
            .read_u8()
            .map_err(|_| ConfigError::MissingTerminator)?;
        if opcode == 0 {
            trace!("Record decoded, {} bytes consumed", reader.position());
            return Ok(record);
        }
        let instrs = schema
            .opcodes
            .get(&opcode)
            .ok_or(ConfigError::UnknownOpcode(opcode))?;
        execute(instrs, &mut reader, &mut record, None)
            .map_err(|e| annotate(e, opcode))?;
    }
}

/// Attach the opcode to bare buffer errors so failures are attributable.
fn annotate(error: ConfigError, opcode: u8) -> ConfigError {
    match error {
        ConfigError::OpcodeDecode { source, .. } => ConfigError::OpcodeDecode { opcode, source },
        other => other,
    }
}

fn execute(
    instrs: &[Instr],
    reader: &mut Reader<'_>,
    record: &mut Record,
    index: Option<usize>,
) -> Result<()> {
    for instr in instrs {
        match instr {
            Instr::Read { slot, codec } => {
                let value = codec
                    .decode(reader)
                    .map_err(|source| ConfigError::OpcodeDecode { opcode: 0, source })?;
                write(record, *slot, index, value)?;
            }
            Instr::Set { slot, value } => {
                write(record, *slot, index, value.clone())?;
            }
            Instr::Repeat { count, body } => {
                let count = count
                    .decode(reader)
                    .map_err(|source| ConfigError::OpcodeDecode { opcode: 0, source })?
                    .as_int()
                    .ok_or(ConfigError::InvalidSchema("repeat count must be an integer"))?;
                if count < 0 {
                    return Err(ConfigError::InvalidCount(count));
                }
                let count = count as usize;
                for field in indexed_fields(body) {
                    record.prepare_list(field, count);
                }
                for i in 0..count {
                    execute(body, reader, record, Some(i))?;
                }
            }
        }
    }
    Ok(())
}

fn write(record: &mut Record, slot: Slot, index: Option<usize>, value: crate::Value) -> Result<()> {
    match slot {
        Slot::Field(name) => {
            record.set_field(name, value);
            Ok(())
        }
        Slot::Index(name) => {
            let index =
                index.ok_or(ConfigError::InvalidSchema("indexed slot outside a repeat block"))?;
            record.set_index(name, index, value)
        }
    }
}

/// Array fields a repeat body writes, in declaration order.
fn indexed_fields(body: &[Instr]) -> Vec<&'static str> {
    let mut fields = Vec::new();
    for instr in body {
        match instr {
            Instr::Read {
                slot: Slot::Index(name),
                ..
            }
            | Instr::Set {
                slot: Slot::Index(name),
                ..
            } => {
                if !fields.contains(name) {
                    fields.push(*name);
                }
            }
            Instr::Repeat { body, .. } => fields.extend(indexed_fields(body)),
            _ => {}
        }
    }
    fields
}
