//! Expression parameter schema.
//!
//! The prediction service takes a fixed 18-field input. Field order is part of
//! the contract: it is the positional order of the editor controls and the
//! order in which fields are written into the request payload.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Number of fields in the prediction input.
pub const FIELD_COUNT: usize = 18;

/// Field names in contract order.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "image",
    "rotate_pitch",
    "rotate_yaw",
    "rotate_roll",
    "blink",
    "eyebrow",
    "wink",
    "pupil_x",
    "pupil_y",
    "aaa",
    "eee",
    "woo",
    "smile",
    "src_ratio",
    "sample_ratio",
    "crop_factor",
    "output_format",
    "output_quality",
];

/// Expression controls cleared by a reset.
pub const EXPRESSION_FIELDS: [&str; 12] = [
    "rotate_pitch",
    "rotate_yaw",
    "rotate_roll",
    "blink",
    "eyebrow",
    "wink",
    "pupil_x",
    "pupil_y",
    "aaa",
    "eee",
    "woo",
    "smile",
];

/// Editor tab a control lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Input,
    Head,
    Eyes,
    Mouth,
    Settings,
}

/// Kind of control backing a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Local image reference, rewritten to a fetchable URL on submission
    Image,
    /// Bounded numeric slider
    Slider { min: f64, max: f64 },
    /// Free numeric input
    Number { min: Option<f64>, max: Option<f64> },
    /// Fixed set of string choices
    Choice { options: &'static [&'static str] },
}

/// Default value shown by a control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldDefault {
    Unset,
    Number(f64),
    Text(&'static str),
}

/// Static description of one input field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamField {
    pub name: &'static str,
    pub label: &'static str,
    pub group: FieldGroup,
    pub kind: FieldKind,
    pub default: FieldDefault,
}

impl ParamField {
    /// Inclusive numeric bounds, if the field has any.
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match self.kind {
            FieldKind::Slider { min, max } => (Some(min), Some(max)),
            FieldKind::Number { min, max } => (min, max),
            FieldKind::Image | FieldKind::Choice { .. } => (None, None),
        }
    }
}

const fn slider(
    name: &'static str,
    label: &'static str,
    group: FieldGroup,
    min: f64,
    max: f64,
    default: f64,
) -> ParamField {
    ParamField {
        name,
        label,
        group,
        kind: FieldKind::Slider { min, max },
        default: FieldDefault::Number(default),
    }
}

/// All input fields in contract order.
pub static PARAM_FIELDS: [ParamField; FIELD_COUNT] = [
    ParamField {
        name: "image",
        label: "Input image",
        group: FieldGroup::Input,
        kind: FieldKind::Image,
        default: FieldDefault::Unset,
    },
    slider("rotate_pitch", "Rotate Up-Down", FieldGroup::Head, -20.0, 20.0, 0.0),
    slider("rotate_yaw", "Rotate Left-Right turn", FieldGroup::Head, -20.0, 20.0, 0.0),
    slider("rotate_roll", "Rotate Left-Right tilt", FieldGroup::Head, -20.0, 20.0, 0.0),
    slider("blink", "Blink", FieldGroup::Eyes, -20.0, 5.0, 0.0),
    slider("eyebrow", "Eyebrow", FieldGroup::Eyes, -10.0, 15.0, 0.0),
    slider("wink", "Wink", FieldGroup::Eyes, 0.0, 25.0, 0.0),
    slider("pupil_x", "Pupil X", FieldGroup::Eyes, -15.0, 15.0, 0.0),
    slider("pupil_y", "Pupil Y", FieldGroup::Eyes, -15.0, 15.0, 0.0),
    slider("aaa", "Aaa", FieldGroup::Mouth, -30.0, 120.0, 0.0),
    slider("eee", "Eee", FieldGroup::Mouth, -20.0, 15.0, 0.0),
    slider("woo", "Woo", FieldGroup::Mouth, -20.0, 15.0, 0.0),
    slider("smile", "Smile", FieldGroup::Mouth, -0.3, 1.3, 0.0),
    ParamField {
        name: "src_ratio",
        label: "Src Ratio",
        group: FieldGroup::Settings,
        kind: FieldKind::Number { min: None, max: None },
        default: FieldDefault::Number(1.0),
    },
    slider("sample_ratio", "Sample Ratio", FieldGroup::Settings, -0.2, 1.2, 1.0),
    slider("crop_factor", "Crop Factor", FieldGroup::Settings, 1.5, 2.5, 1.7),
    ParamField {
        name: "output_format",
        label: "Output format",
        group: FieldGroup::Settings,
        kind: FieldKind::Choice {
            options: OutputFormat::OPTIONS,
        },
        default: FieldDefault::Text("webp"),
    },
    ParamField {
        name: "output_quality",
        label: "Output Quality",
        group: FieldGroup::Settings,
        kind: FieldKind::Number {
            min: Some(0.0),
            max: Some(100.0),
        },
        default: FieldDefault::Number(95.0),
    },
];

/// Look up a field by name.
pub fn field(name: &str) -> Option<&'static ParamField> {
    PARAM_FIELDS.iter().find(|f| f.name == name)
}

/// Output image encoding requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Webp,
    Jpg,
    Png,
}

impl OutputFormat {
    /// Wire names offered by the format control, default first.
    pub const OPTIONS: &'static [&'static str] = &["webp", "jpg", "png"];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = OutputFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "webp" => Ok(OutputFormat::Webp),
            "jpg" => Ok(OutputFormat::Jpg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(OutputFormatParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown output format: {0}")]
pub struct OutputFormatParseError(String);

/// A single field value, tagged by how it must be encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Local file, sent as a URL the service can fetch
    FileRef(PathBuf),
    Number(f64),
    Integer(i64),
    Text(String),
    /// No value; omitted from the payload
    Unset,
}

impl ParamValue {
    /// Whether the value is left out of the request payload.
    pub fn is_omitted(&self) -> bool {
        match self {
            ParamValue::Unset => true,
            ParamValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            ParamValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }
}

/// Current values of every editor control.
///
/// Missing fields deserialize to the editor defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExpressionParams {
    /// Local path of the portrait to edit
    pub image: Option<PathBuf>,
    pub rotate_pitch: f64,
    pub rotate_yaw: f64,
    pub rotate_roll: f64,
    pub blink: f64,
    pub eyebrow: f64,
    pub wink: f64,
    pub pupil_x: f64,
    pub pupil_y: f64,
    pub aaa: f64,
    pub eee: f64,
    pub woo: f64,
    pub smile: f64,
    pub src_ratio: f64,
    pub sample_ratio: f64,
    pub crop_factor: f64,
    pub output_format: OutputFormat,
    /// Output quality, 0 (lowest) to 100 (best)
    pub output_quality: i64,
}

impl Default for ExpressionParams {
    fn default() -> Self {
        Self {
            image: None,
            rotate_pitch: 0.0,
            rotate_yaw: 0.0,
            rotate_roll: 0.0,
            blink: 0.0,
            eyebrow: 0.0,
            wink: 0.0,
            pupil_x: 0.0,
            pupil_y: 0.0,
            aaa: 0.0,
            eee: 0.0,
            woo: 0.0,
            smile: 0.0,
            src_ratio: 1.0,
            sample_ratio: 1.0,
            crop_factor: 1.7,
            output_format: OutputFormat::Webp,
            output_quality: 95,
        }
    }
}

impl ExpressionParams {
    /// Create default parameters for an image.
    pub fn for_image(image: impl Into<PathBuf>) -> Self {
        Self {
            image: Some(image.into()),
            ..Self::default()
        }
    }

    /// All 18 values paired with their field names, in contract order.
    pub fn ordered_values(&self) -> [(&'static str, ParamValue); FIELD_COUNT] {
        let image = match &self.image {
            Some(path) if !path.as_os_str().is_empty() => ParamValue::FileRef(path.clone()),
            _ => ParamValue::Unset,
        };

        [
            ("image", image),
            ("rotate_pitch", ParamValue::Number(self.rotate_pitch)),
            ("rotate_yaw", ParamValue::Number(self.rotate_yaw)),
            ("rotate_roll", ParamValue::Number(self.rotate_roll)),
            ("blink", ParamValue::Number(self.blink)),
            ("eyebrow", ParamValue::Number(self.eyebrow)),
            ("wink", ParamValue::Number(self.wink)),
            ("pupil_x", ParamValue::Number(self.pupil_x)),
            ("pupil_y", ParamValue::Number(self.pupil_y)),
            ("aaa", ParamValue::Number(self.aaa)),
            ("eee", ParamValue::Number(self.eee)),
            ("woo", ParamValue::Number(self.woo)),
            ("smile", ParamValue::Number(self.smile)),
            ("src_ratio", ParamValue::Number(self.src_ratio)),
            ("sample_ratio", ParamValue::Number(self.sample_ratio)),
            ("crop_factor", ParamValue::Number(self.crop_factor)),
            ("output_format", ParamValue::Text(self.output_format.as_str().to_string())),
            ("output_quality", ParamValue::Integer(self.output_quality)),
        ]
    }

    /// Zero the twelve expression controls.
    ///
    /// Image, ratios, crop factor and output settings are kept.
    pub fn reset_expression(&mut self) {
        for value in [
            &mut self.rotate_pitch,
            &mut self.rotate_yaw,
            &mut self.rotate_roll,
            &mut self.blink,
            &mut self.eyebrow,
            &mut self.wink,
            &mut self.pupil_x,
            &mut self.pupil_y,
            &mut self.aaa,
            &mut self.eee,
            &mut self.woo,
            &mut self.smile,
        ] {
            *value = 0.0;
        }
    }
}

impl Validate for ExpressionParams {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (descriptor, (_, value)) in PARAM_FIELDS.iter().zip(self.ordered_values()) {
            let Some(number) = value.as_f64() else {
                continue;
            };

            if !number.is_finite() {
                let mut error = ValidationError::new("finite");
                error.message = Some(Cow::from(format!("{} must be a finite number", descriptor.name)));
                errors.add(descriptor.name, error);
                continue;
            }

            let (min, max) = descriptor.bounds();
            let below = min.is_some_and(|min| number < min);
            let above = max.is_some_and(|max| number > max);
            if below || above {
                let mut error = ValidationError::new("range");
                error.message = Some(Cow::from(format!(
                    "{} must be within [{}, {}]",
                    descriptor.name,
                    min.map_or("-inf".to_string(), |v| v.to_string()),
                    max.map_or("inf".to_string(), |v| v.to_string()),
                )));
                error.add_param(Cow::from("value"), &number);
                errors.add(descriptor.name, error);
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
