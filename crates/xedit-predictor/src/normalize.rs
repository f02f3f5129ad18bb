//! Raw prediction output to display-ready values.

use serde_json::Value;
use xedit_models::{ImageRef, NormalizedOutput, OutputSlot, OutputValue};

use crate::error::{PredictError, PredictResult};

/// Normalize a raw output for the declared result slots.
///
/// A structured-data first slot receives the raw value untouched. Otherwise
/// the output is flattened one level (a scalar counts as one element) and must
/// yield exactly one element per slot; each element is then shaped for its
/// slot. The result is a single value iff exactly one slot is declared.
pub fn normalize_output(raw: Value, slots: &[OutputSlot]) -> PredictResult<NormalizedOutput> {
    if slots.first().is_some_and(OutputSlot::is_structured) {
        return Ok(NormalizedOutput::from_values(vec![OutputValue::Json(raw)], slots.len()));
    }

    let elements = flatten(raw);
    if elements.len() != slots.len() {
        return Err(PredictError::OutputMismatch {
            expected: slots.len(),
            actual: elements.len(),
        });
    }

    let values = slots
        .iter()
        .zip(elements)
        .map(|(slot, element)| shape_for_slot(*slot, element))
        .collect::<PredictResult<Vec<_>>>()?;

    Ok(NormalizedOutput::from_values(values, slots.len()))
}

fn flatten(raw: Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items
            .into_iter()
            .flat_map(|item| match item {
                Value::Array(inner) => inner,
                other => vec![other],
            })
            .collect(),
        other => vec![other],
    }
}

fn shape_for_slot(slot: OutputSlot, element: Value) -> PredictResult<OutputValue> {
    match slot {
        OutputSlot::Image => match element {
            Value::String(reference) if !reference.is_empty() => {
                Ok(OutputValue::Image(ImageRef::from_reference(reference)))
            }
            other => Err(PredictError::malformed_output(
                slot,
                format!("expected an image reference, got {}", other),
            )),
        },
        OutputSlot::Text => Ok(OutputValue::Text(match element {
            Value::String(s) => s,
            other => other.to_string(),
        })),
        OutputSlot::Number => element
            .as_f64()
            .map(OutputValue::Number)
            .ok_or_else(|| PredictError::malformed_output(slot, format!("expected a number, got {}", element))),
        OutputSlot::Json => Ok(OutputValue::Json(element)),
    }
}
