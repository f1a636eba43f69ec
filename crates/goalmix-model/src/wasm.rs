//! WASM bindings for goalmix
//!
//! The browser front end owns the sliders, charts and tables; it calls into
//! these functions on every slider change and renders what comes back.

use wasm_bindgen::prelude::*;

use crate::analysis::BottleneckRule;
use crate::params::Parameters;
use crate::plan::{solve_parameters, PlanOptions};
use crate::scenario::{run_scenarios as run_all, standard_scenarios};

/// Slider descriptors (key, label, min, max, step, default) as JSON
#[wasm_bindgen]
pub fn parameter_fields() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(Parameters::fields()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Default slider values as JSON
#[wasm_bindgen]
pub fn default_parameters() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&Parameters::default()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Solve the plant for the given slider values and return the results record
#[wasm_bindgen]
pub fn solve(params: JsValue, shadow_price_rule: bool) -> Result<JsValue, JsValue> {
    let params: Parameters =
        serde_wasm_bindgen::from_value(params).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let options = if shadow_price_rule {
        PlanOptions::default().with_rule(BottleneckRule::ShadowPrice)
    } else {
        PlanOptions::default()
    };

    let (results, _) = solve_parameters(&params, &options).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&results).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Run the classroom scenarios against the given baseline
#[wasm_bindgen]
pub fn run_scenarios(base: JsValue) -> Result<JsValue, JsValue> {
    let base: Parameters =
        serde_wasm_bindgen::from_value(base).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let analysis = run_all(&base, &standard_scenarios(), &PlanOptions::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&analysis).map_err(|e| JsValue::from_str(&e.to_string()))
}
