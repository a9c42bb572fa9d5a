//! Directory data-quality audit.
//!
//! Reports rows that would degrade recommendations: missing names or
//! expertise, out-of-range scores, broken profile links, placeholder text
//! and duplicated doctors.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::{Database, DbResult};
use crate::models::DoctorListing;

/// Values imported in place of real specialty/expertise text.
const PLACEHOLDERS: &[&str] = &["未知", "暂无", "N/A", "无", "-"];

/// A single audit finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditIssue {
    MissingName { doctor_id: i64 },
    MissingDepartment { doctor_id: i64 },
    MissingHospital { doctor_id: i64 },
    MissingExpertise { doctor_id: i64 },
    InvalidRecommendationScore { doctor_id: i64, value: f64 },
    InvalidProfileUrl { doctor_id: i64, value: String },
    PlaceholderSpecialtyOrExpertise { doctor_id: i64 },
    DuplicateDoctorKey { key: String, count: usize },
}

/// Audit every doctor in the directory.
pub fn audit_directory(db: &Database) -> DbResult<Vec<AuditIssue>> {
    let listings = db.list_doctor_listings()?;
    let issues = audit_listings(&listings);
    tracing::info!(
        doctors = listings.len(),
        issues = issues.len(),
        "Directory audit complete"
    );
    Ok(issues)
}

/// Audit already-loaded listings.
pub fn audit_listings(listings: &[DoctorListing]) -> Vec<AuditIssue> {
    let mut issues = Vec::new();
    let mut keys: BTreeMap<String, usize> = BTreeMap::new();

    for DoctorListing {
        doctor,
        hospital,
        department,
    } in listings
    {
        let doctor_id = doctor.id;
        let key = format!("{}__{}__{}", hospital.name, department.name, doctor.name);
        *keys.entry(key).or_insert(0) += 1;

        if doctor.name.trim().is_empty() {
            issues.push(AuditIssue::MissingName { doctor_id });
        }
        if department.name.trim().is_empty() {
            issues.push(AuditIssue::MissingDepartment { doctor_id });
        }
        if hospital.name.trim().is_empty() {
            issues.push(AuditIssue::MissingHospital { doctor_id });
        }
        if is_blank(doctor.expertise.as_deref()) && is_blank(doctor.specialty.as_deref()) {
            issues.push(AuditIssue::MissingExpertise { doctor_id });
        }
        if let Some(value) = doctor.recommendation_score {
            if !doctor.has_valid_score() {
                issues.push(AuditIssue::InvalidRecommendationScore { doctor_id, value });
            }
        }
        if let Some(url) = doctor.profile_url.as_deref() {
            if !looks_like_url(url) {
                issues.push(AuditIssue::InvalidProfileUrl {
                    doctor_id,
                    value: url.to_string(),
                });
            }
        }
        if is_placeholder(doctor.specialty.as_deref()) || is_placeholder(doctor.expertise.as_deref())
        {
            issues.push(AuditIssue::PlaceholderSpecialtyOrExpertise { doctor_id });
        }
    }

    for (key, count) in keys {
        if count > 1 {
            issues.push(AuditIssue::DuplicateDoctorKey { key, count });
        }
    }

    issues
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn is_placeholder(value: Option<&str>) -> bool {
    value.is_some_and(|v| PLACEHOLDERS.contains(&v.trim()))
}

/// An absolute http(s) URL with a non-empty host.
fn looks_like_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}
