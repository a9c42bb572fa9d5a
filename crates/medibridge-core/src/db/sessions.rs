//! Patient session database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{ChatMessage, PatientSession, Recommendation};

impl Database {
    /// Insert the session, or replace transcript, extraction and
    /// recommendations in place if the session id already exists.
    pub fn upsert_session(&self, session: &PatientSession) -> DbResult<()> {
        let chat_history_json = serde_json::to_string(&session.chat_history)?;
        let recommended_json = if session.recommended_doctors.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&session.recommended_doctors)?)
        };

        self.conn.execute(
            r#"
            INSERT INTO patient_sessions (
                session_id, chat_history, symptoms, duration, age,
                medical_history, recommended_doctors, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(session_id) DO UPDATE SET
                chat_history = excluded.chat_history,
                symptoms = excluded.symptoms,
                duration = excluded.duration,
                age = excluded.age,
                medical_history = excluded.medical_history,
                recommended_doctors = excluded.recommended_doctors,
                updated_at = excluded.updated_at
            "#,
            params![
                session.session_id,
                chat_history_json,
                session.symptoms,
                session.duration,
                session.age,
                session.medical_history,
                recommended_json,
                session.created_at,
                session.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a session by its opaque id.
    pub fn get_session(&self, session_id: &str) -> DbResult<Option<PatientSession>> {
        self.conn
            .query_row(
                r#"
                SELECT session_id, chat_history, symptoms, duration, age,
                       medical_history, recommended_doctors, created_at, updated_at
                FROM patient_sessions
                WHERE session_id = ?
                "#,
                [session_id],
                |row| {
                    Ok(SessionRow {
                        session_id: row.get(0)?,
                        chat_history: row.get(1)?,
                        symptoms: row.get(2)?,
                        duration: row.get(3)?,
                        age: row.get(4)?,
                        medical_history: row.get(5)?,
                        recommended_doctors: row.get(6)?,
                        created_at: row.get(7)?,
                        updated_at: row.get(8)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }
}

/// Intermediate row struct for database mapping.
struct SessionRow {
    session_id: String,
    chat_history: String,
    symptoms: Option<String>,
    duration: Option<String>,
    age: Option<u32>,
    medical_history: Option<String>,
    recommended_doctors: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SessionRow> for PatientSession {
    type Error = DbError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let chat_history: Vec<ChatMessage> = serde_json::from_str(&row.chat_history)?;
        let recommended_doctors: Vec<Recommendation> = row
            .recommended_doctors
            .as_deref()
            .map(|json| serde_json::from_str::<Vec<Recommendation>>(json))
            .transpose()?
            .unwrap_or_default();

        Ok(PatientSession {
            session_id: row.session_id,
            chat_history,
            symptoms: row.symptoms,
            duration: row.duration,
            age: row.age,
            medical_history: row.medical_history,
            recommended_doctors,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
