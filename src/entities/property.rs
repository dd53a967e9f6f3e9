//! Property metadata records.

use std::sync::Arc;

use crate::binary::BinaryReader;
use crate::entities::{AsciiString, Component, EntityFactory, Value};
use crate::{Dataset, Error, Result};

/// Record size in bytes: eight single-byte fields and nine 32-bit fields.
const RECORD_SIZE: usize = 44;

/// Strong type of the values a property can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValueType {
    String,
    Int,
    Double,
    Bool,
    JavaScript,
}

impl PropertyValueType {
    fn from_u8(value: u8, offset: u64) -> Result<Self> {
        match value {
            0 => Ok(Self::String),
            1 => Ok(Self::Int),
            2 => Ok(Self::Double),
            3 => Ok(Self::Bool),
            4 => Ok(Self::JavaScript),
            other => Err(Error::format(
                format!("unknown property value type {}", other),
                offset,
            )),
        }
    }
}

/// Metadata describing one detectable property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    index: u32,
    component_index: u8,
    display_order: u8,
    is_mandatory: bool,
    is_list: bool,
    show_values: bool,
    is_obsolete: bool,
    show: bool,
    value_type: PropertyValueType,
    default_value_index: Option<u32>,
    name_offset: u32,
    description_offset: u32,
    category_offset: u32,
    url_offset: u32,
    first_value_index: u32,
    last_value_index: u32,
    map_count: u32,
    first_map_index: u32,
}

impl Property {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn display_order(&self) -> u8 {
        self.display_order
    }

    pub fn is_mandatory(&self) -> bool {
        self.is_mandatory
    }

    /// Whether a profile may carry more than one value for this property.
    pub fn is_list(&self) -> bool {
        self.is_list
    }

    pub fn show_values(&self) -> bool {
        self.show_values
    }

    pub fn is_obsolete(&self) -> bool {
        self.is_obsolete
    }

    pub fn show(&self) -> bool {
        self.show
    }

    pub fn value_type(&self) -> PropertyValueType {
        self.value_type
    }

    pub fn name(&self, dataset: &Dataset) -> Result<Arc<AsciiString>> {
        dataset.strings()?.get(self.name_offset)
    }

    /// Raw strings offset of the name; used to build the name index before
    /// the dataset exists.
    pub(crate) fn name_offset(&self) -> u32 {
        self.name_offset
    }

    pub fn description(&self, dataset: &Dataset) -> Result<Arc<AsciiString>> {
        dataset.strings()?.get(self.description_offset)
    }

    pub fn category(&self, dataset: &Dataset) -> Result<Arc<AsciiString>> {
        dataset.strings()?.get(self.category_offset)
    }

    pub fn url(&self, dataset: &Dataset) -> Result<Arc<AsciiString>> {
        dataset.strings()?.get(self.url_offset)
    }

    /// The component this property belongs to.
    pub fn component<'d>(&self, dataset: &'d Dataset) -> Result<&'d Component> {
        dataset.components()?.get(u32::from(self.component_index))
    }

    /// The value used when a profile does not state one, if any.
    pub fn default_value(&self, dataset: &Dataset) -> Result<Option<Arc<Value>>> {
        match self.default_value_index {
            Some(index) => Ok(Some(dataset.values()?.get(index)?)),
            None => Ok(None),
        }
    }

    /// Every value defined for this property, in value-section order.
    pub fn values(&self, dataset: &Dataset) -> Result<Vec<Arc<Value>>> {
        let values = dataset.values()?;
        let mut out = Vec::with_capacity(
            (self.last_value_index + 1).saturating_sub(self.first_value_index) as usize,
        );
        for index in self.first_value_index..=self.last_value_index {
            out.push(values.get(index)?);
        }
        Ok(out)
    }
}

/// Factory for [`Property`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyFactory;

impl EntityFactory for PropertyFactory {
    type Entity = Property;

    fn create(&self, index: u32, reader: &mut BinaryReader) -> Result<Property> {
        let component_index = reader.read_u8()?;
        let display_order = reader.read_u8()?;
        let is_mandatory = reader.read_u8()? != 0;
        let is_list = reader.read_u8()? != 0;
        let show_values = reader.read_u8()? != 0;
        let is_obsolete = reader.read_u8()? != 0;
        let show = reader.read_u8()? != 0;
        let value_type_offset = reader.pos();
        let value_type = PropertyValueType::from_u8(reader.read_u8()?, value_type_offset)?;
        let default_value_index = match reader.read_i32()? {
            index if index >= 0 => Some(index as u32),
            _ => None,
        };
        Ok(Property {
            index,
            component_index,
            display_order,
            is_mandatory,
            is_list,
            show_values,
            is_obsolete,
            show,
            value_type,
            default_value_index,
            name_offset: reader.read_u32()?,
            description_offset: reader.read_u32()?,
            category_offset: reader.read_u32()?,
            url_offset: reader.read_u32()?,
            first_value_index: reader.read_u32()?,
            last_value_index: reader.read_u32()?,
            map_count: reader.read_u32()?,
            first_map_index: reader.read_u32()?,
        })
    }

    fn record_length(&self) -> Option<usize> {
        Some(RECORD_SIZE)
    }

    fn entity_length(&self, _entity: &Property) -> usize {
        RECORD_SIZE
    }
}
