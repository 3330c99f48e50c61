// enact-core/src/domain/schema/field.rs

use crate::domain::dataset::CellValue;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// No constraint. Fields without an explicit spec behave like this.
    #[default]
    Any,
    Text,
    Integer,
    /// Accepts integer cells too: a column of measurements may round-trip
    /// through a format that narrows whole numbers.
    Float,
    Bool,
}

impl FieldType {
    pub fn accepts(&self, value: &CellValue) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (Self::Text, CellValue::Text(_)) => true,
            (Self::Integer, CellValue::Integer(_)) => true,
            (Self::Float, CellValue::Float(_) | CellValue::Integer(_)) => true,
            (Self::Bool, CellValue::Bool(_)) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            field_type: FieldType::Any,
            nullable: true,
        }
    }
}

impl FieldSpec {
    pub fn typed(field_type: FieldType) -> Self {
        Self {
            field_type,
            nullable: true,
        }
    }

    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            nullable: false,
        }
    }

    /// A null cell is judged by `nullable` alone; anything else by the type.
    pub fn accepts(&self, value: &CellValue) -> bool {
        if value.is_null() {
            return self.nullable;
        }
        self.field_type.accepts(value)
    }
}
