//! Typed parsing of structured model output.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oldest age accepted from extraction.
pub const MAX_AGE: f64 = 150.0;

/// Structured output errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Whether enough has been gathered to recommend doctors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Gathering,
    Ready,
}

/// Medical facts extracted from the conversation so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Extraction {
    pub keywords: Vec<String>,
    pub symptoms: String,
    pub duration: String,
    pub age: Option<f64>,
    pub ready_for_recommendation: bool,
}

impl Extraction {
    pub fn readiness(&self) -> Readiness {
        if self.ready_for_recommendation {
            Readiness::Ready
        } else {
            Readiness::Gathering
        }
    }

    /// Search and ranking only run when ready and there is something to search for.
    pub fn wants_recommendations(&self) -> bool {
        self.readiness() == Readiness::Ready && !self.keywords.is_empty()
    }

    /// Age as stored on the session.
    pub fn rounded_age(&self) -> Option<u32> {
        self.age.map(|age| age.round() as u32)
    }

    fn validate(&self) -> ExtractionResult<()> {
        if let Some(age) = self.age {
            if !age.is_finite() || !(0.0..=MAX_AGE).contains(&age) {
                return Err(ExtractionError::InvalidField {
                    field: "age",
                    reason: format!("{age} is outside 0-{MAX_AGE}"),
                });
            }
        }
        Ok(())
    }
}

/// One ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedDoctor {
    pub doctor_id: i64,
    pub reason: String,
}

/// Ranked subset of the search candidates.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub selected_doctors: Vec<SelectedDoctor>,
}

impl Ranking {
    /// Drop selections whose id was not among the candidates, keeping order.
    ///
    /// Returns the dropped ids.
    pub fn retain_candidates(&mut self, candidate_ids: &HashSet<i64>) -> Vec<i64> {
        let mut dropped = Vec::new();
        self.selected_doctors.retain(|selected| {
            let keep = candidate_ids.contains(&selected.doctor_id);
            if !keep {
                dropped.push(selected.doctor_id);
            }
            keep
        });
        dropped
    }
}

/// Ranking as emitted by the model; ids arrive as JSON numbers.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawRanking {
    selected_doctors: Vec<RawSelectedDoctor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSelectedDoctor {
    doctor_id: f64,
    reason: String,
}

impl TryFrom<RawSelectedDoctor> for SelectedDoctor {
    type Error = ExtractionError;

    fn try_from(raw: RawSelectedDoctor) -> ExtractionResult<Self> {
        let id = raw.doctor_id;
        if !id.is_finite() || id < 0.0 || id.fract() != 0.0 || id > i64::MAX as f64 {
            return Err(ExtractionError::InvalidField {
                field: "doctorId",
                reason: format!("{id} is not a doctor id"),
            });
        }
        Ok(SelectedDoctor {
            doctor_id: id as i64,
            reason: raw.reason,
        })
    }
}

/// Slice from the first `{` to the last `}`, tolerating provider preamble.
fn json_object(text: &str) -> ExtractionResult<&str> {
    let start = text
        .find('{')
        .ok_or_else(|| ExtractionError::InvalidFormat("No JSON object found in response".into()))?;
    let end = text
        .rfind('}')
        .ok_or_else(|| ExtractionError::InvalidFormat("No closing brace found in response".into()))?;
    if end < start {
        return Err(ExtractionError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }
    Ok(&text[start..=end])
}

/// Parse and validate extraction output.
pub fn parse_extraction(text: &str) -> ExtractionResult<Extraction> {
    let extraction: Extraction = serde_json::from_str(json_object(text)?)?;
    extraction.validate()?;
    Ok(extraction)
}

/// Parse and validate ranking output.
pub fn parse_ranking(text: &str) -> ExtractionResult<Ranking> {
    let raw: RawRanking = serde_json::from_str(json_object(text)?)?;
    let selected_doctors = raw
        .selected_doctors
        .into_iter()
        .map(SelectedDoctor::try_from)
        .collect::<ExtractionResult<Vec<_>>>()?;
    Ok(Ranking { selected_doctors })
}

#[cfg(test)]
mod tests {
    use super::*;

    const READY: &str = r#"{"keywords":["胸痛","心内科"],"symptoms":"chest pain","duration":"3 days","age":54,"readyForRecommendation":true}"#;

    #[test]
    fn test_parse_extraction() {
        let extraction = parse_extraction(READY).unwrap();
        assert_eq!(extraction.keywords, vec!["胸痛", "心内科"]);
        assert_eq!(extraction.age, Some(54.0));
        assert_eq!(extraction.readiness(), Readiness::Ready);
        assert!(extraction.wants_recommendations());
    }

    #[test]
    fn test_parse_extraction_with_preamble() {
        let text = format!("Here is the JSON:\n```json\n{READY}\n```");
        assert!(parse_extraction(&text).is_ok());
    }

    #[test]
    fn test_ready_without_keywords_does_not_recommend() {
        let extraction = parse_extraction(
            r#"{"keywords":[],"symptoms":"","duration":"","age":null,"readyForRecommendation":true}"#,
        )
        .unwrap();
        assert!(!extraction.wants_recommendations());
        assert_eq!(extraction.rounded_age(), None);
    }

    #[test]
    fn test_gathering() {
        let extraction = parse_extraction(
            r#"{"keywords":["cough"],"symptoms":"cough","duration":"","age":null,"readyForRecommendation":false}"#,
        )
        .unwrap();
        assert_eq!(extraction.readiness(), Readiness::Gathering);
        assert!(!extraction.wants_recommendations());
    }

    #[test]
    fn test_extraction_missing_field_rejected() {
        let result = parse_extraction(r#"{"keywords":[],"symptoms":"x"}"#);
        assert!(matches!(result, Err(ExtractionError::JsonParse(_))));
    }

    #[test]
    fn test_extraction_unknown_field_rejected() {
        let text = READY.replace("\"age\":54", "\"age\":54,\"mood\":\"ok\"");
        assert!(parse_extraction(&text).is_err());
    }

    #[test]
    fn test_extraction_without_json_rejected() {
        assert!(matches!(
            parse_extraction("I could not extract anything"),
            Err(ExtractionError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_extraction("} backwards {"),
            Err(ExtractionError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_age_bounds() {
        assert!(parse_extraction(&READY.replace("54", "-1")).is_err());
        assert!(parse_extraction(&READY.replace("54", "151")).is_err());

        let extraction = parse_extraction(&READY.replace("54", "33.6")).unwrap();
        assert_eq!(extraction.rounded_age(), Some(34));
    }

    #[test]
    fn test_parse_ranking() {
        let ranking = parse_ranking(
            r#"{"selectedDoctors":[{"doctorId":7,"reason":"cardiology"},{"doctorId":3.0,"reason":"arrhythmia"}]}"#,
        )
        .unwrap();
        assert_eq!(
            ranking.selected_doctors,
            vec![
                SelectedDoctor { doctor_id: 7, reason: "cardiology".into() },
                SelectedDoctor { doctor_id: 3, reason: "arrhythmia".into() },
            ]
        );
    }

    #[test]
    fn test_ranking_rejects_fractional_or_negative_ids() {
        assert!(parse_ranking(r#"{"selectedDoctors":[{"doctorId":1.5,"reason":""}]}"#).is_err());
        assert!(parse_ranking(r#"{"selectedDoctors":[{"doctorId":-2,"reason":""}]}"#).is_err());
    }

    #[test]
    fn test_retain_candidates_filters_and_keeps_order() {
        let mut ranking = parse_ranking(
            r#"{"selectedDoctors":[
                {"doctorId":5,"reason":"a"},
                {"doctorId":999,"reason":"made up"},
                {"doctorId":2,"reason":"b"},
                {"doctorId":5,"reason":"again"}
            ]}"#,
        )
        .unwrap();

        let candidates: HashSet<i64> = [2, 5, 8].into_iter().collect();
        let dropped = ranking.retain_candidates(&candidates);

        assert_eq!(dropped, vec![999]);
        let ids: Vec<i64> = ranking.selected_doctors.iter().map(|s| s.doctor_id).collect();
        assert_eq!(ids, vec![5, 2, 5]);
    }

    #[test]
    fn test_ranking_serializes_camel_case() {
        let ranking = Ranking {
            selected_doctors: vec![SelectedDoctor { doctor_id: 1, reason: "r".into() }],
        };
        let json = serde_json::to_string(&ranking).unwrap();
        assert_eq!(json, r#"{"selectedDoctors":[{"doctorId":1,"reason":"r"}]}"#);
    }
}
