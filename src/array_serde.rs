// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::fmt;
use std::marker::PhantomData;

use crate::element::Element;
use crate::{Dataset, Ix};

/// Serialization layout version of a dataset.
pub const DATASET_FORMAT_VERSION: u8 = 1u8;

/// Verifies that the version of the deserialized dataset matches the current
/// `DATASET_FORMAT_VERSION`.
pub fn verify_version<E>(v: u8) -> Result<(), E>
where
    E: de::Error,
{
    if v != DATASET_FORMAT_VERSION {
        let err_msg = format!("unknown dataset version: {}", v);
        Err(de::Error::custom(err_msg))
    } else {
        Ok(())
    }
}

/// Serializes the name, shape, item size and the elements in logical order.
/// Metadata is not serialized.
///
/// **Requires crate feature `"serde"`**
impl<A> Serialize for Dataset<A>
where
    A: Element + Serialize,
{
    fn serialize<Se>(&self, serializer: Se) -> Result<Se::Ok, Se::Error>
    where
        Se: Serializer,
    {
        let mut state = serializer.serialize_struct("Dataset", 5)?;
        state.serialize_field("v", &DATASET_FORMAT_VERSION)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("shape", self.shape())?;
        state.serialize_field("item_size", &self.item_size())?;
        state.serialize_field("data", &self.to_vec())?;
        state.end()
    }
}

struct DatasetVisitor<A> {
    _marker: PhantomData<A>,
}

enum DatasetField {
    Version,
    Name,
    Shape,
    ItemSize,
    Data,
}

static DATASET_FIELDS: &[&str] = &["v", "name", "shape", "item_size", "data"];

/// **Requires crate feature `"serde"`**
impl<'de, A> Deserialize<'de> for Dataset<A>
where
    A: Element + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Dataset<A>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_struct(
            "Dataset",
            DATASET_FIELDS,
            DatasetVisitor {
                _marker: PhantomData,
            },
        )
    }
}

impl<'de> Deserialize<'de> for DatasetField {
    fn deserialize<D>(deserializer: D) -> Result<DatasetField, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DatasetFieldVisitor;

        impl<'de> Visitor<'de> for DatasetFieldVisitor {
            type Value = DatasetField;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(r#""v", "name", "shape", "item_size" or "data""#)
            }

            fn visit_str<E>(self, value: &str) -> Result<DatasetField, E>
            where
                E: de::Error,
            {
                match value {
                    "v" => Ok(DatasetField::Version),
                    "name" => Ok(DatasetField::Name),
                    "shape" => Ok(DatasetField::Shape),
                    "item_size" => Ok(DatasetField::ItemSize),
                    "data" => Ok(DatasetField::Data),
                    other => Err(de::Error::unknown_field(other, DATASET_FIELDS)),
                }
            }
        }

        deserializer.deserialize_identifier(DatasetFieldVisitor)
    }
}

fn build<A: Element, E: de::Error>(
    name: String,
    shape: Vec<Ix>,
    item_size: usize,
    data: Vec<A>,
) -> Result<Dataset<A>, E> {
    match Dataset::from_compound_vec(item_size, &shape, data) {
        Ok(d) => Ok(d.with_name(&name)),
        Err(e) => Err(de::Error::custom(e)),
    }
}

impl<'de, A> Visitor<'de> for DatasetVisitor<A>
where
    A: Element + Deserialize<'de>,
{
    type Value = Dataset<A>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("ndset dataset representation")
    }

    fn visit_seq<V>(self, mut visitor: V) -> Result<Dataset<A>, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let v: u8 = match visitor.next_element()? {
            Some(value) => value,
            None => return Err(de::Error::invalid_length(0, &self)),
        };
        verify_version(v)?;
        let name: String = match visitor.next_element()? {
            Some(value) => value,
            None => return Err(de::Error::invalid_length(1, &self)),
        };
        let shape: Vec<Ix> = match visitor.next_element()? {
            Some(value) => value,
            None => return Err(de::Error::invalid_length(2, &self)),
        };
        let item_size: usize = match visitor.next_element()? {
            Some(value) => value,
            None => return Err(de::Error::invalid_length(3, &self)),
        };
        let data: Vec<A> = match visitor.next_element()? {
            Some(value) => value,
            None => return Err(de::Error::invalid_length(4, &self)),
        };
        build(name, shape, item_size, data)
    }

    fn visit_map<V>(self, mut visitor: V) -> Result<Dataset<A>, V::Error>
    where
        V: MapAccess<'de>,
    {
        let mut v: Option<u8> = None;
        let mut name: Option<String> = None;
        let mut shape: Option<Vec<Ix>> = None;
        let mut item_size: Option<usize> = None;
        let mut data: Option<Vec<A>> = None;

        while let Some(key) = visitor.next_key()? {
            match key {
                DatasetField::Version => {
                    let val = visitor.next_value()?;
                    verify_version(val)?;
                    v = Some(val);
                }
                DatasetField::Name => name = Some(visitor.next_value()?),
                DatasetField::Shape => shape = Some(visitor.next_value()?),
                DatasetField::ItemSize => item_size = Some(visitor.next_value()?),
                DatasetField::Data => data = Some(visitor.next_value()?),
            }
        }

        if v.is_none() {
            return Err(de::Error::missing_field("v"));
        }
        let shape = shape.ok_or_else(|| de::Error::missing_field("shape"))?;
        let data = data.ok_or_else(|| de::Error::missing_field("data"))?;
        build(name.unwrap_or_default(), shape, item_size.unwrap_or(1), data)
    }
}
