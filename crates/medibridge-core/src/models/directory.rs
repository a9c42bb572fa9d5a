//! Directory models: hospitals, departments and doctors.

use serde::{Deserialize, Serialize};

/// Lowest valid recommendation score.
pub const MIN_RECOMMENDATION_SCORE: f64 = 0.0;

/// Highest valid recommendation score.
pub const MAX_RECOMMENDATION_SCORE: f64 = 10.0;

/// A top-level medical institution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    /// English display name
    pub name_en: Option<String>,
    pub city: String,
    /// Tier, e.g. "三级甲等"
    pub level: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

impl Hospital {
    /// Create a hospital with required fields and the directory defaults.
    pub fn new(name: String) -> Self {
        Self {
            id: 0,
            name,
            name_en: None,
            city: "上海".into(),
            level: Some("三级甲等".into()),
            address: None,
            contact: None,
            website: None,
            description: None,
        }
    }
}

/// A department inside exactly one hospital.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub hospital_id: i64,
    pub name: String,
    pub name_en: Option<String>,
    pub description: Option<String>,
}

impl Department {
    pub fn new(hospital_id: i64, name: String) -> Self {
        Self {
            id: 0,
            hospital_id,
            name,
            name_en: None,
            description: None,
        }
    }
}

/// A doctor listed in the directory.
///
/// `hospital_id` is denormalized from the department.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: i64,
    pub hospital_id: i64,
    pub department_id: i64,
    pub name: String,
    pub name_en: Option<String>,
    /// Professional title (e.g. "主任医师")
    pub title: Option<String>,
    pub specialty: Option<String>,
    pub specialty_en: Option<String>,
    pub expertise: Option<String>,
    pub expertise_en: Option<String>,
    pub website_url: Option<String>,
    /// External profile page; doctors with one are preferred in search.
    pub profile_url: Option<String>,
    pub satisfaction_rate: Option<String>,
    pub attitude_score: Option<String>,
    /// Expected range 0-10.
    pub recommendation_score: Option<f64>,
    pub online_consultation: Option<String>,
    pub appointment_available: Option<String>,
}

impl Doctor {
    /// Create a doctor with required fields.
    pub fn new(hospital_id: i64, department_id: i64, name: String) -> Self {
        Self {
            id: 0,
            hospital_id,
            department_id,
            name,
            name_en: None,
            title: None,
            specialty: None,
            specialty_en: None,
            expertise: None,
            expertise_en: None,
            website_url: None,
            profile_url: None,
            satisfaction_rate: None,
            attitude_score: None,
            recommendation_score: None,
            online_consultation: None,
            appointment_available: None,
        }
    }

    /// Whether the recommendation score is absent or within 0-10.
    pub fn has_valid_score(&self) -> bool {
        match self.recommendation_score {
            None => true,
            Some(score) => {
                score.is_finite()
                    && (MIN_RECOMMENDATION_SCORE..=MAX_RECOMMENDATION_SCORE).contains(&score)
            }
        }
    }

    /// Expertise text cut to at most `max_chars` characters (not bytes).
    pub fn expertise_excerpt(&self, max_chars: usize) -> Option<String> {
        self.expertise
            .as_deref()
            .map(|text| text.chars().take(max_chars).collect())
    }
}

/// A doctor joined with its hospital and department.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorListing {
    pub doctor: Doctor,
    pub hospital: Hospital,
    pub department: Department,
}

impl DoctorListing {
    /// Whether `keyword` occurs (case-sensitively) in any searchable field.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let contains = |field: Option<&str>| field.is_some_and(|f| f.contains(keyword));
        contains(self.doctor.expertise.as_deref())
            || contains(self.doctor.specialty.as_deref())
            || contains(Some(&self.department.name))
            || contains(Some(&self.hospital.name))
    }
}

/// A department with a few representative doctors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepartmentHighlight {
    pub department: Department,
    pub hospital: Hospital,
    pub doctors: Vec<Doctor>,
}
