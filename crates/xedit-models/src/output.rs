//! Output slots and normalized output values.

use std::fmt;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of a declared result destination.
///
/// Declared once with the editor layout; the normalizer never infers it from
/// the shape of the service response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputSlot {
    /// Image display, fed by a file or URL reference
    Image,
    /// Text display, values forwarded unchanged
    Text,
    /// Numeric display, values forwarded unchanged
    Number,
    /// Structured-data display, receives the whole raw output
    Json,
}

impl OutputSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSlot::Image => "image",
            OutputSlot::Text => "text",
            OutputSlot::Number => "number",
            OutputSlot::Json => "json",
        }
    }

    /// Whether this slot bypasses flattening and receives the raw output.
    pub fn is_structured(&self) -> bool {
        matches!(self, OutputSlot::Json)
    }
}

impl fmt::Display for OutputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result slots of the expression editor: one edited image.
pub const EDITOR_SLOTS: &[OutputSlot] = &[OutputSlot::Image];

/// Reference to a displayable image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageRef {
    /// Remote `http(s)` URL or inline `data:` URI
    Url(String),
    /// File on the local filesystem
    Local(PathBuf),
}

impl ImageRef {
    /// Classify a reference string returned by the service.
    pub fn from_reference(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        if reference.starts_with("http://")
            || reference.starts_with("https://")
            || reference.starts_with("data:")
        {
            ImageRef::Url(reference)
        } else {
            ImageRef::Local(PathBuf::from(reference))
        }
    }
}

/// One display-ready value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OutputValue {
    Image(ImageRef),
    Text(String),
    Number(f64),
    Json(serde_json::Value),
}

impl OutputValue {
    pub fn as_image(&self) -> Option<&ImageRef> {
        match self {
            OutputValue::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// Normalized result of a prediction.
///
/// `Single` is produced if and only if exactly one result slot is declared.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedOutput {
    Single(OutputValue),
    Many(Vec<OutputValue>),
}

impl NormalizedOutput {
    /// Wrap values produced for `slot_count` declared slots.
    pub fn from_values(mut values: Vec<OutputValue>, slot_count: usize) -> Self {
        if slot_count == 1 && values.len() == 1 {
            NormalizedOutput::Single(values.remove(0))
        } else {
            NormalizedOutput::Many(values)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NormalizedOutput::Single(_) => 1,
            NormalizedOutput::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_single(&self) -> Option<&OutputValue> {
        match self {
            NormalizedOutput::Single(value) => Some(value),
            NormalizedOutput::Many(_) => None,
        }
    }

    /// Iterate values in slot order.
    pub fn values(&self) -> impl Iterator<Item = &OutputValue> {
        match self {
            NormalizedOutput::Single(value) => std::slice::from_ref(value).iter(),
            NormalizedOutput::Many(values) => values.iter(),
        }
    }

    pub fn into_values(self) -> Vec<OutputValue> {
        match self {
            NormalizedOutput::Single(value) => vec![value],
            NormalizedOutput::Many(values) => values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_only_for_one_slot() {
        let value = OutputValue::Text("a".into());
        assert!(NormalizedOutput::from_values(vec![value.clone()], 1).as_single().is_some());

        let two = NormalizedOutput::from_values(vec![value.clone(), value.clone()], 2);
        assert_eq!(two.len(), 2);
        assert!(two.as_single().is_none());
    }

    #[test]
    fn test_image_reference_classification() {
        assert_eq!(
            ImageRef::from_reference("https://cdn.example.com/out.webp"),
            ImageRef::Url("https://cdn.example.com/out.webp".into())
        );
        assert_eq!(
            ImageRef::from_reference("data:image/png;base64,AAAA"),
            ImageRef::Url("data:image/png;base64,AAAA".into())
        );
        assert_eq!(
            ImageRef::from_reference("/tmp/out.png"),
            ImageRef::Local(PathBuf::from("/tmp/out.png"))
        );
    }

    #[test]
    fn test_single_serializes_as_bare_value() {
        let output = NormalizedOutput::Single(OutputValue::Image(ImageRef::Url("http://x/y.png".into())));
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["kind"], "image");
        assert_eq!(json["value"]["value"], "http://x/y.png");
    }
}
