//! Directory database operations.

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Department, DepartmentHighlight, Doctor, DoctorListing, Hospital};

/// Joined doctor/hospital/department projection, columns in `listing_from_row` order.
pub(crate) const LISTING_SELECT: &str = r#"
    SELECT d.id, d.hospital_id, d.department_id, d.name, d.name_en, d.title,
           d.specialty, d.specialty_en, d.expertise, d.expertise_en,
           d.website_url, d.profile_url, d.satisfaction_rate, d.attitude_score,
           d.recommendation_score, d.online_consultation, d.appointment_available,
           h.id, h.name, h.name_en, h.city, h.level, h.address, h.contact,
           h.website, h.description,
           p.id, p.hospital_id, p.name, p.name_en, p.description
    FROM doctors d
    JOIN hospitals h ON d.hospital_id = h.id
    JOIN departments p ON d.department_id = p.id
"#;

const DOCTOR_COLUMNS: usize = 17;
const HOSPITAL_COLUMNS: usize = 9;

/// Rows scanned when building department highlights.
const HIGHLIGHT_SCAN_LIMIT: i64 = 2000;

impl Database {
    /// Insert a hospital, returning its generated id.
    pub fn insert_hospital(&self, hospital: &Hospital) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO hospitals (
                name, name_en, city, level, address, contact, website, description
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                hospital.name,
                hospital.name_en,
                hospital.city,
                hospital.level,
                hospital.address,
                hospital.contact,
                hospital.website,
                hospital.description,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a department, returning its generated id.
    pub fn insert_department(&self, department: &Department) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO departments (hospital_id, name, name_en, description)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                department.hospital_id,
                department.name,
                department.name_en,
                department.description,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a doctor, returning its generated id.
    ///
    /// Rejects scores outside 0-10 and departments belonging to another hospital.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<i64> {
        if !doctor.has_valid_score() {
            return Err(DbError::Constraint(format!(
                "recommendation score {:?} for {} is outside 0-10",
                doctor.recommendation_score, doctor.name
            )));
        }

        let department_hospital: Option<i64> = self
            .conn
            .query_row(
                "SELECT hospital_id FROM departments WHERE id = ?",
                [doctor.department_id],
                |row| row.get(0),
            )
            .optional()?;
        match department_hospital {
            None => {
                return Err(DbError::NotFound(format!(
                    "department {}",
                    doctor.department_id
                )))
            }
            Some(hospital_id) if hospital_id != doctor.hospital_id => {
                return Err(DbError::Constraint(format!(
                    "department {} belongs to hospital {}, not {}",
                    doctor.department_id, hospital_id, doctor.hospital_id
                )))
            }
            Some(_) => {}
        }

        self.conn.execute(
            r#"
            INSERT INTO doctors (
                hospital_id, department_id, name, name_en, title,
                specialty, specialty_en, expertise, expertise_en,
                website_url, profile_url, satisfaction_rate, attitude_score,
                recommendation_score, online_consultation, appointment_available
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                doctor.hospital_id,
                doctor.department_id,
                doctor.name,
                doctor.name_en,
                doctor.title,
                doctor.specialty,
                doctor.specialty_en,
                doctor.expertise,
                doctor.expertise_en,
                doctor.website_url,
                doctor.profile_url,
                doctor.satisfaction_rate,
                doctor.attitude_score,
                doctor.recommendation_score,
                doctor.online_consultation,
                doctor.appointment_available,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a doctor with hospital and department by ID.
    pub fn get_doctor_by_id(&self, doctor_id: i64) -> DbResult<Option<DoctorListing>> {
        let sql = format!("{LISTING_SELECT} WHERE d.id = ? LIMIT 1");
        let listing = self
            .conn
            .query_row(&sql, [doctor_id], listing_from_row)
            .optional()?;
        Ok(listing)
    }

    /// Doctors of one department, best recommendation score first.
    pub fn doctors_by_department(
        &self,
        department_id: i64,
        limit: usize,
    ) -> DbResult<Vec<DoctorListing>> {
        let sql = format!(
            r#"{LISTING_SELECT}
            WHERE d.department_id = ?
            ORDER BY d.recommendation_score IS NULL, d.recommendation_score DESC, d.id
            LIMIT ?"#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![department_id, limit as i64], listing_from_row)?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        Ok(listings)
    }

    /// Every doctor listing, by id.
    pub fn list_doctor_listings(&self) -> DbResult<Vec<DoctorListing>> {
        let sql = format!("{LISTING_SELECT} ORDER BY d.id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], listing_from_row)?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        Ok(listings)
    }

    /// Get all hospitals ordered by name.
    pub fn list_hospitals(&self) -> DbResult<Vec<Hospital>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, name_en, city, level, address, contact, website, description
            FROM hospitals
            ORDER BY name
            "#,
        )?;
        let rows = stmt.query_map([], |row| hospital_from_row(row, 0))?;

        let mut hospitals = Vec::new();
        for row in rows {
            hospitals.push(row?);
        }
        Ok(hospitals)
    }

    /// Get departments of a hospital ordered by name.
    pub fn departments_by_hospital(&self, hospital_id: i64) -> DbResult<Vec<Department>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, hospital_id, name, name_en, description
            FROM departments
            WHERE hospital_id = ?
            ORDER BY name
            "#,
        )?;
        let rows = stmt.query_map([hospital_id], |row| department_from_row(row, 0))?;

        let mut departments = Vec::new();
        for row in rows {
            departments.push(row?);
        }
        Ok(departments)
    }

    /// Pick a few representative doctors per department.
    ///
    /// Departments come in name order; doctors with a profile link and a
    /// higher score are picked first.
    pub fn department_highlights(
        &self,
        limit_departments: usize,
        doctors_per_department: usize,
    ) -> DbResult<Vec<DepartmentHighlight>> {
        let sql = format!(
            r#"{LISTING_SELECT}
            ORDER BY p.name,
                     d.profile_url IS NOT NULL DESC,
                     d.recommendation_score IS NULL,
                     d.recommendation_score DESC,
                     d.id
            LIMIT ?"#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([HIGHLIGHT_SCAN_LIMIT], listing_from_row)?;

        let mut highlights: Vec<DepartmentHighlight> = Vec::new();
        let mut index_by_department: HashMap<i64, usize> = HashMap::new();

        for row in rows {
            let listing = row?;
            match index_by_department.get(&listing.department.id) {
                Some(&idx) => {
                    let group = &mut highlights[idx];
                    if group.doctors.len() < doctors_per_department {
                        group.doctors.push(listing.doctor);
                    }
                }
                None => {
                    if highlights.len() >= limit_departments {
                        continue;
                    }
                    index_by_department.insert(listing.department.id, highlights.len());
                    highlights.push(DepartmentHighlight {
                        department: listing.department,
                        hospital: listing.hospital,
                        doctors: if doctors_per_department > 0 {
                            vec![listing.doctor]
                        } else {
                            Vec::new()
                        },
                    });
                }
            }
        }

        Ok(highlights)
    }

    /// Number of doctors in the directory.
    pub fn count_doctors(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Map a row produced by `LISTING_SELECT`.
pub(crate) fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<DoctorListing> {
    Ok(DoctorListing {
        doctor: doctor_from_row(row, 0)?,
        hospital: hospital_from_row(row, DOCTOR_COLUMNS)?,
        department: department_from_row(row, DOCTOR_COLUMNS + HOSPITAL_COLUMNS)?,
    })
}

fn doctor_from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(at)?,
        hospital_id: row.get(at + 1)?,
        department_id: row.get(at + 2)?,
        name: row.get(at + 3)?,
        name_en: row.get(at + 4)?,
        title: row.get(at + 5)?,
        specialty: row.get(at + 6)?,
        specialty_en: row.get(at + 7)?,
        expertise: row.get(at + 8)?,
        expertise_en: row.get(at + 9)?,
        website_url: row.get(at + 10)?,
        profile_url: row.get(at + 11)?,
        satisfaction_rate: row.get(at + 12)?,
        attitude_score: row.get(at + 13)?,
        recommendation_score: row.get(at + 14)?,
        online_consultation: row.get(at + 15)?,
        appointment_available: row.get(at + 16)?,
    })
}

fn hospital_from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Hospital> {
    Ok(Hospital {
        id: row.get(at)?,
        name: row.get(at + 1)?,
        name_en: row.get(at + 2)?,
        city: row.get(at + 3)?,
        level: row.get(at + 4)?,
        address: row.get(at + 5)?,
        contact: row.get(at + 6)?,
        website: row.get(at + 7)?,
        description: row.get(at + 8)?,
    })
}

fn department_from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get(at)?,
        hospital_id: row.get(at + 1)?,
        name: row.get(at + 2)?,
        name_en: row.get(at + 3)?,
        description: row.get(at + 4)?,
    })
}
