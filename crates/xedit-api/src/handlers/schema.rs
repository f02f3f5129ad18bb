//! Editor schema handler.

use axum::Json;
use schemars::schema::RootSchema;
use serde::Serialize;
use xedit_models::{ExpressionParams, OutputSlot, ParamField, EDITOR_SLOTS, EXPRESSION_FIELDS, PARAM_FIELDS};

/// Controls and result slots of the editor.
#[derive(Serialize)]
pub struct SchemaResponse {
    pub fields: &'static [ParamField],
    pub outputs: &'static [OutputSlot],
    pub reset_fields: &'static [&'static str],
    pub input_schema: RootSchema,
}

/// Describe the editor's inputs and outputs.
pub async fn editor_schema() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        fields: &PARAM_FIELDS,
        outputs: EDITOR_SLOTS,
        reset_fields: &EXPRESSION_FIELDS,
        input_schema: schemars::schema_for!(ExpressionParams),
    })
}
