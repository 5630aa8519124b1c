//! The decoded record value.

use std::collections::BTreeMap;

use js5_parser::ParamValue;

use crate::instr::{Schema, Value};
use crate::{ConfigError, Result};

/// A decoded record: named fields holding scalar, string, parameter-table
/// or array values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: BTreeMap<&'static str, Value>,
}

impl Record {
    pub(crate) fn with_defaults(schema: &Schema) -> Self {
        Self {
            fields: schema.defaults.iter().cloned().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// An integer field; `None` if unset or of another type.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    /// A string field.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// An array field.
    pub fn list(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_list)
    }

    /// A parameter-table field.
    pub fn params(&self, name: &str) -> Option<&BTreeMap<u32, ParamValue>> {
        self.get(name).and_then(Value::as_params)
    }

    /// Iterate the record's fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(&name, value)| (name, value))
    }

    pub(crate) fn set_field(&mut self, name: &'static str, value: Value) {
        self.fields.insert(name, value);
    }

    /// Pre-size an array field to `len` unset slots.
    pub(crate) fn prepare_list(&mut self, name: &'static str, len: usize) {
        self.fields.insert(name, Value::List(vec![Value::Null; len]));
    }

    pub(crate) fn set_index(
        &mut self,
        name: &'static str,
        index: usize,
        value: Value,
    ) -> Result<()> {
        let Some(Value::List(list)) = self.fields.get_mut(name) else {
            return Err(ConfigError::InvalidSchema("indexed write to a non-array field"));
        };
        let len = list.len();
        let slot = list.get_mut(index).ok_or(ConfigError::IndexOutOfRange {
            field: name,
            index,
            len,
        })?;
        *slot = value;
        Ok(())
    }
}
