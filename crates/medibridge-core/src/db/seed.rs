//! Directory seeding from a nested JSON document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Database, DbError, DbResult};
use crate::models::{Department, Doctor, Hospital};

/// Nested directory document: hospitals → departments → doctors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySeed {
    pub hospitals: Vec<HospitalSeed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HospitalSeed {
    pub name: String,
    pub name_en: Option<String>,
    pub city: Option<String>,
    pub level: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub departments: Vec<DepartmentSeed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DepartmentSeed {
    pub name: String,
    pub name_en: Option<String>,
    pub description: Option<String>,
    pub doctors: Vec<DoctorSeed>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoctorSeed {
    pub name: String,
    pub name_en: Option<String>,
    pub title: Option<String>,
    pub specialty: Option<String>,
    pub specialty_en: Option<String>,
    pub expertise: Option<String>,
    pub expertise_en: Option<String>,
    pub website_url: Option<String>,
    pub profile_url: Option<String>,
    pub satisfaction_rate: Option<String>,
    pub attitude_score: Option<String>,
    pub recommendation_score: Option<f64>,
    pub online_consultation: Option<String>,
    pub appointment_available: Option<String>,
}

/// Rows created by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub hospitals: usize,
    pub departments: usize,
    pub doctors: usize,
}

impl DirectorySeed {
    /// Parse a seed document.
    pub fn from_json(json: &str) -> DbResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a seed file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| DbError::NotFound(format!("seed file {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

impl Database {
    /// Import a seed document in one transaction. Nothing is written if any row fails.
    pub fn import_seed(&self, seed: &DirectorySeed) -> DbResult<SeedSummary> {
        let tx = self.conn.unchecked_transaction()?;
        let mut summary = SeedSummary::default();

        for hospital_seed in &seed.hospitals {
            let mut hospital = Hospital::new(hospital_seed.name.clone());
            hospital.name_en = hospital_seed.name_en.clone();
            if let Some(city) = &hospital_seed.city {
                hospital.city = city.clone();
            }
            if hospital_seed.level.is_some() {
                hospital.level = hospital_seed.level.clone();
            }
            hospital.address = hospital_seed.address.clone();
            hospital.contact = hospital_seed.contact.clone();
            hospital.website = hospital_seed.website.clone();
            hospital.description = hospital_seed.description.clone();
            let hospital_id = self.insert_hospital(&hospital)?;
            summary.hospitals += 1;

            for department_seed in &hospital_seed.departments {
                let mut department = Department::new(hospital_id, department_seed.name.clone());
                department.name_en = department_seed.name_en.clone();
                department.description = department_seed.description.clone();
                let department_id = self.insert_department(&department)?;
                summary.departments += 1;

                for doctor_seed in &department_seed.doctors {
                    let doctor = doctor_seed.to_doctor(hospital_id, department_id);
                    self.insert_doctor(&doctor)?;
                    summary.doctors += 1;
                }
            }
        }

        tx.commit()?;
        tracing::info!(
            hospitals = summary.hospitals,
            departments = summary.departments,
            doctors = summary.doctors,
            "Directory seed imported"
        );
        Ok(summary)
    }
}

impl DoctorSeed {
    fn to_doctor(&self, hospital_id: i64, department_id: i64) -> Doctor {
        Doctor {
            id: 0,
            hospital_id,
            department_id,
            name: self.name.clone(),
            name_en: self.name_en.clone(),
            title: self.title.clone(),
            specialty: self.specialty.clone(),
            specialty_en: self.specialty_en.clone(),
            expertise: self.expertise.clone(),
            expertise_en: self.expertise_en.clone(),
            website_url: self.website_url.clone(),
            profile_url: self.profile_url.clone(),
            satisfaction_rate: self.satisfaction_rate.clone(),
            attitude_score: self.attitude_score.clone(),
            recommendation_score: self.recommendation_score,
            online_consultation: self.online_consultation.clone(),
            appointment_available: self.appointment_available.clone(),
        }
    }
}
