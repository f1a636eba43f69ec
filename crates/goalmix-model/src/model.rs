use std::collections::{BTreeMap, HashSet};

use crate::error::ModelError;
use crate::params::Parameters;

/// A sellable product and its market limits
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub name: String,
    pub label: String,
    /// Throughput per unit sold ($)
    pub profit: f64,
    /// Maximum units the market takes
    pub demand: f64,
}

/// A resource with a fixed number of hours per period
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct WorkCenter {
    pub name: String,
    pub label: String,
    /// Available hours per period
    pub capacity: f64,
    /// Hours one unit of each product spends here, keyed by product name
    pub processing_times: BTreeMap<String, f64>,
}

/// Products, work centers and routings of a plant.
///
/// Declaration order matters: it is the column order of the linear program
/// and the priority order used when breaking bottleneck ties.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionModel {
    pub name: String,
    pub products: Vec<Product>,
    pub work_centers: Vec<WorkCenter>,
}

impl Product {
    pub fn new(name: impl Into<String>, label: impl Into<String>, profit: f64, demand: f64) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            profit,
            demand,
        }
    }
}

impl WorkCenter {
    pub fn new(name: impl Into<String>, label: impl Into<String>, capacity: f64) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            capacity,
            processing_times: BTreeMap::new(),
        }
    }

    /// Set the hours per unit of `product` at this work center
    pub fn time(mut self, product: impl Into<String>, hours: f64) -> Self {
        self.processing_times.insert(product.into(), hours);
        self
    }
}

impl ProductionModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            products: Vec::new(),
            work_centers: Vec::new(),
        }
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    pub fn with_work_center(mut self, work_center: WorkCenter) -> Self {
        self.work_centers.push(work_center);
        self
    }

    /// The two-product, three-work-center teaching plant driven by the sliders
    pub fn goal_plant(params: &Parameters) -> Self {
        Self::new("The Goal")
            .with_product(Product::new("product_a", "Product A", params.profit_a, params.demand_a))
            .with_product(Product::new("product_b", "Product B", params.profit_b, params.demand_b))
            .with_work_center(
                WorkCenter::new("machining", "Machining", params.machining_capacity)
                    .time("product_a", 2.5)
                    .time("product_b", 1.5),
            )
            .with_work_center(
                WorkCenter::new("heat_treatment", "Heat Treatment", params.heat_treatment_capacity)
                    .time("product_a", 4.0)
                    .time("product_b", 2.0),
            )
            .with_work_center(
                WorkCenter::new("assembly", "Assembly", params.assembly_capacity)
                    .time("product_a", 2.0)
                    .time("product_b", 1.5),
            )
    }

    /// UniCo Manufacturing: three models through four work centers, 160 hours a month
    pub fn unico() -> Self {
        Self::new("UniCo Manufacturing")
            .with_product(Product::new("model_x", "Model X", 90.0, 50.0))
            .with_product(Product::new("model_y", "Model Y", 100.0, 60.0))
            .with_product(Product::new("model_z", "Model Z", 70.0, 80.0))
            .with_work_center(
                WorkCenter::new("machining", "Machining", 160.0)
                    .time("model_x", 2.0)
                    .time("model_y", 1.5)
                    .time("model_z", 1.0),
            )
            .with_work_center(
                WorkCenter::new("heat_treatment", "Heat Treatment", 140.0)
                    .time("model_x", 3.0)
                    .time("model_y", 2.5)
                    .time("model_z", 2.0),
            )
            .with_work_center(
                WorkCenter::new("assembly", "Assembly", 160.0)
                    .time("model_x", 1.5)
                    .time("model_y", 2.0)
                    .time("model_z", 1.0),
            )
            .with_work_center(
                WorkCenter::new("quality_control", "Quality Control", 160.0)
                    .time("model_x", 0.5)
                    .time("model_y", 1.0)
                    .time("model_z", 0.5),
            )
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn work_center(&self, name: &str) -> Option<&WorkCenter> {
        self.work_centers.iter().find(|w| w.name == name)
    }

    /// Hours one unit of `product` needs at `work_center`
    pub fn processing_time(&self, work_center: &WorkCenter, product: &Product) -> Result<f64, ModelError> {
        work_center
            .processing_times
            .get(&product.name)
            .copied()
            .ok_or_else(|| ModelError::MissingProcessingTime {
                work_center: work_center.name.clone(),
                product: product.name.clone(),
            })
    }

    /// Fail fast on anything the linear program cannot represent
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.products.is_empty() {
            return Err(ModelError::Empty("products"));
        }
        if self.work_centers.is_empty() {
            return Err(ModelError::Empty("work centers"));
        }

        let mut seen = HashSet::new();
        for product in &self.products {
            if !seen.insert(product.name.as_str()) {
                return Err(ModelError::DuplicateName {
                    kind: "product",
                    name: product.name.clone(),
                });
            }
            check_amount(&format!("profit of {}", product.name), product.profit)?;
            check_amount(&format!("demand of {}", product.name), product.demand)?;
        }

        let mut seen = HashSet::new();
        for wc in &self.work_centers {
            if !seen.insert(wc.name.as_str()) {
                return Err(ModelError::DuplicateName {
                    kind: "work center",
                    name: wc.name.clone(),
                });
            }
            check_amount(&format!("capacity of {}", wc.name), wc.capacity)?;
            if wc.capacity == 0.0 {
                return Err(ModelError::NonPositiveCapacity(wc.name.clone()));
            }

            for product in &self.products {
                let hours = self.processing_time(wc, product)?;
                check_amount(&format!("processing time of {} at {}", product.name, wc.name), hours)?;
            }
            if let Some(unknown) = wc.processing_times.keys().find(|p| self.product(p).is_none()) {
                return Err(ModelError::UnknownProduct {
                    work_center: wc.name.clone(),
                    product: unknown.clone(),
                });
            }
        }
        Ok(())
    }
}

impl From<&Parameters> for ProductionModel {
    fn from(params: &Parameters) -> Self {
        Self::goal_plant(params)
    }
}

fn check_amount(what: &str, value: f64) -> Result<(), ModelError> {
    if !value.is_finite() {
        return Err(ModelError::NonFinite { what: what.to_string() });
    }
    if value < 0.0 {
        return Err(ModelError::NegativeValue {
            what: what.to_string(),
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_plant_is_valid() {
        let model = ProductionModel::from(&Parameters::default());
        assert!(model.validate().is_ok());
        assert_eq!(model.products.len(), 2);
        assert_eq!(model.work_centers.len(), 3);
        assert_eq!(model.work_center("heat_treatment").unwrap().capacity, 160.0);
    }

    #[test]
    fn test_unico_is_valid() {
        let model = ProductionModel::unico();
        assert!(model.validate().is_ok());
        assert_eq!(model.work_centers.len(), 4);
    }

    #[test]
    fn test_missing_processing_time() {
        let mut model = ProductionModel::goal_plant(&Parameters::default());
        model.work_centers[2].processing_times.remove("product_b");

        assert_eq!(
            model.validate(),
            Err(ModelError::MissingProcessingTime {
                work_center: "assembly".to_string(),
                product: "product_b".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_product_in_routing() {
        let mut model = ProductionModel::goal_plant(&Parameters::default());
        model.work_centers[0].processing_times.insert("product_c".to_string(), 1.0);

        assert!(matches!(
            model.validate(),
            Err(ModelError::UnknownProduct { ref product, .. }) if product == "product_c"
        ));
    }

    #[test]
    fn test_negative_demand() {
        let params = Parameters {
            demand_a: -5.0,
            ..Parameters::default()
        };
        let model = ProductionModel::goal_plant(&params);
        assert!(matches!(model.validate(), Err(ModelError::NegativeValue { value, .. }) if value == -5.0));
    }

    #[test]
    fn test_zero_capacity() {
        let params = Parameters {
            assembly_capacity: 0.0,
            ..Parameters::default()
        };
        let model = ProductionModel::goal_plant(&params);
        assert_eq!(model.validate(), Err(ModelError::NonPositiveCapacity("assembly".to_string())));
    }

    #[test]
    fn test_duplicate_product() {
        let model = ProductionModel::new("dup")
            .with_product(Product::new("a", "A", 1.0, 1.0))
            .with_product(Product::new("a", "A again", 1.0, 1.0))
            .with_work_center(WorkCenter::new("wc", "WC", 1.0).time("a", 1.0));

        assert!(matches!(model.validate(), Err(ModelError::DuplicateName { kind: "product", .. })));
    }

    #[test]
    fn test_empty_model() {
        assert_eq!(ProductionModel::new("empty").validate(), Err(ModelError::Empty("products")));
    }
}
