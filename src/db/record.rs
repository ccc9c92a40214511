//! Record-to-mapping conversion shared by every stored row.

use serde::Serialize;
use serde::ser::Error as _;
use serde_json::{Map, Value};

/// Column name to value, in declaration order.
pub type FieldMap = Map<String, Value>;

pub trait AsFieldMap {
    fn as_field_map(&self) -> Result<FieldMap, serde_json::Error>;
}

impl<T> AsFieldMap for T
where
    T: Serialize,
{
    fn as_field_map(&self) -> Result<FieldMap, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde_json::Error::custom(format!(
                "record serialized to a non-object value: {other}"
            ))),
        }
    }
}

pub fn to_field_maps<'a, T, I>(records: I) -> Result<Vec<FieldMap>, serde_json::Error>
where
    T: AsFieldMap + 'a,
    I: IntoIterator<Item = &'a T>,
{
    records.into_iter().map(AsFieldMap::as_field_map).collect()
}
