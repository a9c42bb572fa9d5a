//! JSON schemas constraining the structured model calls.

use serde_json::{json, Value};

use crate::gateway::ResponseFormat;

pub const EXTRACTION_SCHEMA_NAME: &str = "medical_extraction";
pub const RANKING_SCHEMA_NAME: &str = "doctor_ranking";

/// Schema for the per-turn medical extraction.
pub fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "keywords": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Extracted medical keywords"
            },
            "symptoms": { "type": "string", "description": "Symptom description" },
            "duration": { "type": "string", "description": "Duration description" },
            "age": { "type": ["number", "null"], "description": "Patient age" },
            "readyForRecommendation": {
                "type": "boolean",
                "description": "Ready to recommend doctors"
            }
        },
        "required": ["keywords", "symptoms", "duration", "age", "readyForRecommendation"],
        "additionalProperties": false
    })
}

/// Schema for the candidate ranking.
pub fn ranking_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "selectedDoctors": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "doctorId": { "type": "number" },
                        "reason": { "type": "string" }
                    },
                    "required": ["doctorId", "reason"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["selectedDoctors"],
        "additionalProperties": false
    })
}

pub fn extraction_format() -> ResponseFormat {
    ResponseFormat::json_schema(EXTRACTION_SCHEMA_NAME, extraction_schema())
}

pub fn ranking_format() -> ResponseFormat {
    ResponseFormat::json_schema(RANKING_SCHEMA_NAME, ranking_schema())
}
