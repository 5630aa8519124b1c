//! Enum definitions: script-visible key/value maps.

use std::collections::BTreeMap;

use js5_store::CacheProvider;

use crate::instr::{FieldCodec, Instr, Schema, Slot, Value};
use crate::loader::ConfigLoader;
use crate::record::Record;
use crate::Result;

use super::CONFIG_INDEX;

/// Archive of the config index holding enum records.
pub const ENUMS_ARCHIVE: u32 = 8;

/// The decode table for one enum record.
pub fn schema() -> Schema {
    Schema::new(vec![
        ("key_type", Value::Int(0)),
        ("value_type", Value::Int(0)),
        ("default_string", Value::Null),
        ("default_int", Value::Int(0)),
    ])
    .with_opcode(1, vec![Instr::read(Slot::Field("key_type"), FieldCodec::U8)])
    .with_opcode(
        2,
        vec![Instr::read(Slot::Field("value_type"), FieldCodec::U8)],
    )
    .with_opcode(
        3,
        vec![Instr::read(Slot::Field("default_string"), FieldCodec::Text)],
    )
    .with_opcode(
        4,
        vec![Instr::read(Slot::Field("default_int"), FieldCodec::I32)],
    )
    .with_opcode(
        5,
        vec![Instr::Repeat {
            count: FieldCodec::U16,
            body: vec![
                Instr::read(Slot::Index("keys"), FieldCodec::I32),
                Instr::read(Slot::Index("string_values"), FieldCodec::Text),
            ],
        }],
    )
    .with_opcode(
        6,
        vec![Instr::Repeat {
            count: FieldCodec::U16,
            body: vec![
                Instr::read(Slot::Index("keys"), FieldCodec::I32),
                Instr::read(Slot::Index("int_values"), FieldCodec::I32),
            ],
        }],
    )
}

/// A typed enum definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumDefinition {
    pub id: u32,
    pub key_type: u8,
    pub value_type: u8,
    pub default_string: Option<String>,
    pub default_int: i32,
    pub string_values: BTreeMap<i32, String>,
    pub int_values: BTreeMap<i32, i32>,
}

impl EnumDefinition {
    pub fn from_record(id: u32, record: &Record) -> Self {
        let keys: Vec<i32> = record
            .list("keys")
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_int().map(|v| v as i32))
            .collect();

        let mut string_values = BTreeMap::new();
        if let Some(values) = record.list("string_values") {
            for (key, value) in keys.iter().zip(values) {
                if let Some(text) = value.as_str() {
                    string_values.insert(*key, text.to_owned());
                }
            }
        }
        let mut int_values = BTreeMap::new();
        if let Some(values) = record.list("int_values") {
            for (key, value) in keys.iter().zip(values) {
                if let Some(int) = value.as_int() {
                    int_values.insert(*key, int as i32);
                }
            }
        }

        Self {
            id,
            key_type: record.int("key_type").unwrap_or(0) as u8,
            value_type: record.int("value_type").unwrap_or(0) as u8,
            default_string: record.string("default_string").map(str::to_owned),
            default_int: record.int("default_int").unwrap_or(0) as i32,
            string_values,
            int_values,
        }
    }

    /// Look up an integer mapping, falling back to the default.
    pub fn int(&self, key: i32) -> i32 {
        self.int_values.get(&key).copied().unwrap_or(self.default_int)
    }

    /// Look up a string mapping, falling back to the default.
    pub fn string(&self, key: i32) -> Option<&str> {
        self.string_values
            .get(&key)
            .map(String::as_str)
            .or(self.default_string.as_deref())
    }
}

/// Load every enum definition in the cache.
pub async fn load_all(provider: &dyn CacheProvider) -> Result<BTreeMap<u32, EnumDefinition>> {
    let loader = ConfigLoader::new(CONFIG_INDEX, schema());
    let records = loader
        .load_group(provider, ENUMS_ARCHIVE)
        .await?
        .unwrap_or_default();
    Ok(records
        .into_iter()
        .map(|(id, record)| (id, EnumDefinition::from_record(id, &record)))
        .collect())
}
