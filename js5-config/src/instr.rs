//! The declarative coder instruction set.
//!
//! A schema is pure data: per opcode, an ordered list of instructions that
//! read wire values into named fields, set constants (flag opcodes), or
//! repeat an instruction block a counted number of times into array fields.
//! One interpreter executes every schema; no record type carries decode
//! logic of its own.

use std::collections::BTreeMap;
use std::collections::HashMap;

use js5_parser::{ParamValue, Reader};

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unset slot.
    Null,
    Int(i64),
    Str(String),
    Params(BTreeMap<u32, ParamValue>),
    List(Vec<Value>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_params(&self) -> Option<&BTreeMap<u32, ParamValue>> {
        match self {
            Self::Params(v) => Some(v),
            _ => None,
        }
    }
}

/// A wire encoding one field read uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCodec {
    U8,
    I8,
    U16,
    I16,
    U24,
    I32,
    I64,
    /// u16 with `0xFFFF` mapped to -1.
    U16N,
    /// 1-or-2 byte unsigned smart.
    USmart,
    /// Unsigned smart minus one.
    USmartM1,
    /// 2-or-4 byte signed smart.
    BigSmart,
    /// 2-or-4 byte smart, inverted polarity.
    BigSmart2,
    /// Little-endian base-128 varint.
    VarIntLe,
    /// Zero-terminated string.
    Text,
    /// Version-prefixed zero-terminated string.
    VersionedText,
    /// Key/value parameter table.
    Params,
}

impl FieldCodec {
    /// Decode one value off the reader.
    pub(crate) fn decode(self, reader: &mut Reader<'_>) -> js5_parser::Result<Value> {
        Ok(match self {
            Self::U8 => Value::Int(i64::from(reader.read_u8()?)),
            Self::I8 => Value::Int(i64::from(reader.read_i8()?)),
            Self::U16 => Value::Int(i64::from(reader.read_u16()?)),
            Self::I16 => Value::Int(i64::from(reader.read_i16()?)),
            Self::U24 => Value::Int(i64::from(reader.read_u24()?)),
            Self::I32 => Value::Int(i64::from(reader.read_i32()?)),
            Self::I64 => Value::Int(reader.read_i64()?),
            Self::U16N => Value::Int(i64::from(reader.read_u16n()?)),
            Self::USmart => Value::Int(i64::from(reader.read_unsigned_smart()?)),
            Self::USmartM1 => Value::Int(i64::from(reader.read_unsigned_smart_minus_one()?)),
            Self::BigSmart => Value::Int(i64::from(reader.read_big_smart()?)),
            Self::BigSmart2 => Value::Int(i64::from(reader.read_big_smart2()?)),
            Self::VarIntLe => Value::Int(i64::from(reader.read_varint_le()?)),
            Self::Text => Value::Str(reader.read_string()?),
            Self::VersionedText => Value::Str(reader.read_versioned_string()?),
            Self::Params => Value::Params(reader.read_params()?),
        })
    }
}

/// Where a decoded value lands: a scalar field, or the current repeat
/// iteration's slot of an array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Field(&'static str),
    Index(&'static str),
}

/// One step of an opcode's coder list.
#[derive(Debug, Clone)]
pub enum Instr {
    /// Decode a value and write it to a slot.
    Read { slot: Slot, codec: FieldCodec },
    /// Write a constant to a slot (flag opcodes carry no wire data).
    Set { slot: Slot, value: Value },
    /// Decode a count, pre-size the array fields the body writes, then run
    /// the body once per iteration.
    Repeat { count: FieldCodec, body: Vec<Instr> },
}

impl Instr {
    /// Shorthand for a [`Instr::Read`].
    pub fn read(slot: Slot, codec: FieldCodec) -> Self {
        Self::Read { slot, codec }
    }

    /// Shorthand for a [`Instr::Set`].
    pub fn set(slot: Slot, value: Value) -> Self {
        Self::Set { slot, value }
    }
}

/// A record type's decode table: opcode -> coder list, plus the record's
/// default field values.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub(crate) opcodes: HashMap<u8, Vec<Instr>>,
    pub(crate) defaults: Vec<(&'static str, Value)>,
}

impl Schema {
    pub fn new(defaults: Vec<(&'static str, Value)>) -> Self {
        Self {
            opcodes: HashMap::new(),
            defaults,
        }
    }

    /// Register an opcode's coder list. Opcode 0 is the terminator and
    /// cannot carry instructions.
    pub fn with_opcode(mut self, opcode: u8, instrs: Vec<Instr>) -> Self {
        debug_assert!(opcode != 0, "opcode 0 is the record terminator");
        self.opcodes.insert(opcode, instrs);
        self
    }
}
