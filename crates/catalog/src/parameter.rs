use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use retail_core::validation::required_text;
use retail_core::{
    Direction, DomainResult, Entity, ParameterId, ProductInfoId, ProductParameterId, SortKey,
};

/// Maximum parameter name length (characters).
pub const PARAMETER_NAME_MAX: usize = 40;

/// Maximum parameter value length (characters).
pub const PARAMETER_VALUE_MAX: usize = 100;

/// A named attribute key such as "color".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: ParameterId,
    pub name: String,
}

impl Entity for Parameter {
    type Id = ParameterId;
    const KIND: &'static str = "parameter";

    fn id(&self) -> &ParameterId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParameter {
    pub id: ParameterId,
    pub name: String,
}

impl NewParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ParameterId::new(),
            name: name.into(),
        }
    }

    pub fn into_record(self) -> DomainResult<Parameter> {
        validate_name(&self.name)?;
        Ok(Parameter {
            id: self.id,
            name: self.name,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterPatch {
    pub name: Option<String>,
}

impl ParameterPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn apply(self, parameter: &mut Parameter) -> DomainResult<()> {
        if let Some(name) = self.name {
            validate_name(&name)?;
            parameter.name = name;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    required_text("parameter name", name, PARAMETER_NAME_MAX)
}

/// Sort keys for parameter listings. Default: name, descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSort {
    #[default]
    Name,
    Id,
}

impl SortKey for ParameterSort {
    type Record = Parameter;
    const DEFAULT_DIRECTION: Direction = Direction::Descending;

    fn column(&self) -> &'static str {
        match self {
            ParameterSort::Name => "name",
            ParameterSort::Id => "id",
        }
    }

    fn compare(&self, a: &Parameter, b: &Parameter) -> Ordering {
        match self {
            ParameterSort::Name => a.name.cmp(&b.name),
            ParameterSort::Id => a.id.cmp(&b.id),
        }
    }
}

/// The value of one parameter on one listing. `(product_info, parameter)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductParameter {
    pub id: ProductParameterId,
    pub product_info_id: ProductInfoId,
    pub parameter_id: ParameterId,
    pub value: String,
}

impl Entity for ProductParameter {
    type Id = ProductParameterId;
    const KIND: &'static str = "product_parameter";

    fn id(&self) -> &ProductParameterId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductParameter {
    pub id: ProductParameterId,
    pub product_info_id: ProductInfoId,
    pub parameter_id: ParameterId,
    pub value: String,
}

impl NewProductParameter {
    pub fn new(
        product_info_id: ProductInfoId,
        parameter_id: ParameterId,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: ProductParameterId::new(),
            product_info_id,
            parameter_id,
            value: value.into(),
        }
    }

    pub fn into_record(self) -> DomainResult<ProductParameter> {
        validate_value(&self.value)?;
        Ok(ProductParameter {
            id: self.id,
            product_info_id: self.product_info_id,
            parameter_id: self.parameter_id,
            value: self.value,
        })
    }
}

/// Partial update of a listing attribute. Only the value can change; re-keying an
/// attribute is a delete plus an insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductParameterPatch {
    pub value: Option<String>,
}

impl ProductParameterPatch {
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn apply(self, parameter: &mut ProductParameter) -> DomainResult<()> {
        if let Some(value) = self.value {
            validate_value(&value)?;
            parameter.value = value;
        }
        Ok(())
    }
}

fn validate_value(value: &str) -> DomainResult<()> {
    required_text("parameter value", value, PARAMETER_VALUE_MAX)
}

/// Sort keys for a listing's attributes. Default: id ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductParameterSort {
    #[default]
    Id,
    Value,
}

impl SortKey for ProductParameterSort {
    type Record = ProductParameter;
    const DEFAULT_DIRECTION: Direction = Direction::Ascending;

    fn column(&self) -> &'static str {
        match self {
            ProductParameterSort::Id => "id",
            ProductParameterSort::Value => "value",
        }
    }

    fn compare(&self, a: &ProductParameter, b: &ProductParameter) -> Ordering {
        match self {
            ProductParameterSort::Id => a.id.cmp(&b.id),
            ProductParameterSort::Value => a.value.cmp(&b.value),
        }
    }
}
