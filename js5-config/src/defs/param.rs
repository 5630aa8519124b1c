//! Param definitions: typed default values referenced by other records'
//! parameter tables.

use std::collections::BTreeMap;

use js5_parser::CacheVersion;
use js5_store::CacheProvider;

use crate::instr::{FieldCodec, Instr, Schema, Slot, Value};
use crate::loader::ConfigLoader;
use crate::record::Record;
use crate::Result;

use super::CONFIG_INDEX;

/// Archive of the config index holding param records.
pub const PARAMS_ARCHIVE: u32 = 11;

/// Revision that introduced the auto-disable flag opcode.
const AUTODISABLE_REVISION: i32 = 1090;

/// The decode table for one param record.
pub fn schema(version: &CacheVersion) -> Schema {
    let mut schema = Schema::new(vec![
        ("type", Value::Int(0)),
        ("default_int", Value::Int(0)),
        ("default_string", Value::Null),
        ("autodisable", Value::Int(1)),
    ])
    .with_opcode(1, vec![Instr::read(Slot::Field("type"), FieldCodec::U8)])
    .with_opcode(
        2,
        vec![Instr::read(Slot::Field("default_int"), FieldCodec::I32)],
    )
    .with_opcode(
        5,
        vec![Instr::read(Slot::Field("default_string"), FieldCodec::Text)],
    );
    if version.is_at_least(&CacheVersion::new(version.era, AUTODISABLE_REVISION)) {
        schema = schema.with_opcode(
            4,
            vec![Instr::set(Slot::Field("autodisable"), Value::Int(0))],
        );
    }
    schema
}

/// A typed param definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDefinition {
    pub id: u32,
    /// Character code of the scripted value type, 0 when untyped.
    pub value_type: u8,
    pub default_int: i32,
    pub default_string: Option<String>,
    pub autodisable: bool,
}

impl ParamDefinition {
    pub fn from_record(id: u32, record: &Record) -> Self {
        Self {
            id,
            value_type: record.int("type").unwrap_or(0) as u8,
            default_int: record.int("default_int").unwrap_or(0) as i32,
            default_string: record.string("default_string").map(str::to_owned),
            autodisable: record.int("autodisable").unwrap_or(1) != 0,
        }
    }
}

/// Load every param definition in the cache.
pub async fn load_all(
    provider: &dyn CacheProvider,
    version: &CacheVersion,
) -> Result<BTreeMap<u32, ParamDefinition>> {
    let loader = ConfigLoader::new(CONFIG_INDEX, schema(version));
    let records = loader
        .load_group(provider, PARAMS_ARCHIVE)
        .await?
        .unwrap_or_default();
    Ok(records
        .into_iter()
        .map(|(id, record)| (id, ParamDefinition::from_record(id, &record)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_record;
    use js5_parser::Era;
    use pretty_assertions::assert_eq;

    fn current() -> CacheVersion {
        CacheVersion::new(Era::Osrs, 2000)
    }

    #[test]
    fn decodes_typical_record() {
        let mut data = vec![1u8, b'i'];
        data.push(2);
        data.extend_from_slice(&25i32.to_be_bytes());
        data.push(4);
        data.push(0);

        let record = decode_record(&schema(&current()), &data).unwrap();
        let param = ParamDefinition::from_record(9, &record);
        assert_eq!(
            param,
            ParamDefinition {
                id: 9,
                value_type: b'i',
                default_int: 25,
                default_string: None,
                autodisable: false,
            }
        );
    }

    #[test]
    fn defaults_apply() {
        let record = decode_record(&schema(&current()), &[0]).unwrap();
        let param = ParamDefinition::from_record(0, &record);
        assert_eq!(param.default_int, 0);
        assert!(param.autodisable);
        assert_eq!(param.default_string, None);
    }

    #[test]
    fn autodisable_opcode_is_gated_by_revision() {
        let old = CacheVersion::new(Era::Osrs, 900);
        assert!(matches!(
            decode_record(&schema(&old), &[4, 0]),
            Err(crate::ConfigError::UnknownOpcode(4))
        ));
        assert!(decode_record(&schema(&current()), &[4, 0]).is_ok());
    }

    #[test]
    fn string_default() {
        let mut data = vec![5u8];
        data.extend_from_slice(b"none\0");
        data.push(0);
        let record = decode_record(&schema(&current()), &data).unwrap();
        assert_eq!(record.string("default_string"), Some("none"));
    }
}
