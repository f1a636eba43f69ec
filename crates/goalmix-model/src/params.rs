//! Slider parameters of the teaching plant.
//!
//! The plant has two products (A and B) routed through three work centers.
//! Every scalar the user can move is described by a [`ParameterField`] with
//! the fixed min/max/step range the interactive front end offers.

use crate::error::ParameterError;

/// Descriptor of one slider-backed parameter
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterField {
    pub key: &'static str,
    pub label: &'static str,
    pub group: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

const CAPACITIES: &str = "Work Center Capacities";
const PRODUCTS: &str = "Product Parameters";

pub const FIELDS: [ParameterField; 7] = [
    ParameterField {
        key: "machining_capacity",
        label: "Machining Center",
        group: CAPACITIES,
        unit: "hours/week",
        min: 100.0,
        max: 300.0,
        step: 10.0,
        default: 200.0,
    },
    ParameterField {
        key: "heat_treatment_capacity",
        label: "Heat Treatment",
        group: CAPACITIES,
        unit: "hours/week",
        min: 80.0,
        max: 240.0,
        step: 10.0,
        default: 160.0,
    },
    ParameterField {
        key: "assembly_capacity",
        label: "Assembly Center",
        group: CAPACITIES,
        unit: "hours/week",
        min: 100.0,
        max: 300.0,
        step: 10.0,
        default: 180.0,
    },
    ParameterField {
        key: "demand_a",
        label: "Max Demand - Product A",
        group: PRODUCTS,
        unit: "units",
        min: 0.0,
        max: 100.0,
        step: 5.0,
        default: 50.0,
    },
    ParameterField {
        key: "demand_b",
        label: "Max Demand - Product B",
        group: PRODUCTS,
        unit: "units",
        min: 0.0,
        max: 150.0,
        step: 5.0,
        default: 80.0,
    },
    ParameterField {
        key: "profit_a",
        label: "Profit per unit - Product A",
        group: PRODUCTS,
        unit: "$",
        min: 50.0,
        max: 150.0,
        step: 5.0,
        default: 90.0,
    },
    ParameterField {
        key: "profit_b",
        label: "Profit per unit - Product B",
        group: PRODUCTS,
        unit: "$",
        min: 30.0,
        max: 100.0,
        step: 5.0,
        default: 60.0,
    },
];

/// Named scalars of the teaching plant
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub machining_capacity: f64,
    pub heat_treatment_capacity: f64,
    pub assembly_capacity: f64,
    pub demand_a: f64,
    pub demand_b: f64,
    pub profit_a: f64,
    pub profit_b: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            machining_capacity: 200.0,
            heat_treatment_capacity: 160.0,
            assembly_capacity: 180.0,
            demand_a: 50.0,
            demand_b: 80.0,
            profit_a: 90.0,
            profit_b: 60.0,
        }
    }
}

impl Parameters {
    /// Slider descriptors, in display order
    pub fn fields() -> &'static [ParameterField] {
        &FIELDS
    }

    pub fn field(key: &str) -> Option<&'static ParameterField> {
        FIELDS.iter().find(|f| f.key == key)
    }

    pub fn get(&self, key: &str) -> Result<f64, ParameterError> {
        match key {
            "machining_capacity" => Ok(self.machining_capacity),
            "heat_treatment_capacity" => Ok(self.heat_treatment_capacity),
            "assembly_capacity" => Ok(self.assembly_capacity),
            "demand_a" => Ok(self.demand_a),
            "demand_b" => Ok(self.demand_b),
            "profit_a" => Ok(self.profit_a),
            "profit_b" => Ok(self.profit_b),
            _ => Err(ParameterError::UnknownField(key.to_string())),
        }
    }

    pub fn set(&mut self, key: &str, value: f64) -> Result<(), ParameterError> {
        let slot = match key {
            "machining_capacity" => &mut self.machining_capacity,
            "heat_treatment_capacity" => &mut self.heat_treatment_capacity,
            "assembly_capacity" => &mut self.assembly_capacity,
            "demand_a" => &mut self.demand_a,
            "demand_b" => &mut self.demand_b,
            "profit_a" => &mut self.profit_a,
            "profit_b" => &mut self.profit_b,
            _ => return Err(ParameterError::UnknownField(key.to_string())),
        };
        *slot = value;
        Ok(())
    }

    /// Copy with one field replaced
    pub fn with(mut self, key: &str, value: f64) -> Result<Self, ParameterError> {
        self.set(key, value)?;
        Ok(self)
    }

    /// Check every field against its slider range
    pub fn validate(&self) -> Result<(), ParameterError> {
        for field in &FIELDS {
            let value = self.get(field.key)?;
            if !value.is_finite() {
                return Err(ParameterError::NonFinite {
                    field: field.key.to_string(),
                });
            }
            if value < field.min || value > field.max {
                return Err(ParameterError::OutOfRange {
                    field: field.key.to_string(),
                    value,
                    min: field.min,
                    max: field.max,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_field_descriptors() {
        let params = Parameters::default();
        for field in Parameters::fields() {
            assert_eq!(params.get(field.key).unwrap(), field.default, "{}", field.key);
            assert!(field.min <= field.default && field.default <= field.max);
        }
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_set_and_get() {
        let params = Parameters::default().with("heat_treatment_capacity", 200.0).unwrap();
        assert_eq!(params.heat_treatment_capacity, 200.0);
        assert_eq!(params.get("heat_treatment_capacity").unwrap(), 200.0);
    }

    #[test]
    fn test_unknown_field() {
        let mut params = Parameters::default();
        assert_eq!(
            params.set("paint_capacity", 10.0),
            Err(ParameterError::UnknownField("paint_capacity".to_string()))
        );
    }

    #[test]
    fn test_out_of_range() {
        let params = Parameters {
            demand_b: 151.0,
            ..Parameters::default()
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, ParameterError::OutOfRange { ref field, .. } if field == "demand_b"));
    }

    #[test]
    fn test_nan_is_rejected() {
        let params = Parameters {
            profit_a: f64::NAN,
            ..Parameters::default()
        };
        assert_eq!(
            params.validate(),
            Err(ParameterError::NonFinite {
                field: "profit_a".to_string()
            })
        );
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let params = Parameters {
            heat_treatment_capacity: 240.0,
            demand_a: 0.0,
            ..Parameters::default()
        };
        assert!(params.validate().is_ok());
    }
}
