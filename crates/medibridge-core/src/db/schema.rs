//! SQLite schema definition.

/// Complete database schema for MediBridge.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Directory: hospitals, departments, doctors (read-only on the request path)
-- ============================================================================

CREATE TABLE IF NOT EXISTS hospitals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    name_en TEXT,
    city TEXT NOT NULL DEFAULT '上海',
    level TEXT DEFAULT '三级甲等',
    address TEXT,
    contact TEXT,
    website TEXT,
    description TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS departments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hospital_id INTEGER NOT NULL REFERENCES hospitals(id),
    name TEXT NOT NULL,
    name_en TEXT,
    description TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_departments_hospital ON departments(hospital_id);

CREATE TABLE IF NOT EXISTS doctors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hospital_id INTEGER NOT NULL REFERENCES hospitals(id),
    department_id INTEGER NOT NULL REFERENCES departments(id),
    name TEXT NOT NULL,
    name_en TEXT,
    title TEXT,
    specialty TEXT,
    specialty_en TEXT,
    expertise TEXT,
    expertise_en TEXT,
    website_url TEXT,
    profile_url TEXT,
    satisfaction_rate TEXT,
    attitude_score TEXT,
    recommendation_score REAL,
    online_consultation TEXT,
    appointment_available TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_doctors_hospital ON doctors(hospital_id);
CREATE INDEX IF NOT EXISTS idx_doctors_department ON doctors(department_id);
CREATE INDEX IF NOT EXISTS idx_doctors_recommendation ON doctors(recommendation_score);

-- ============================================================================
-- Patient Sessions
-- ============================================================================

CREATE TABLE IF NOT EXISTS patient_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL UNIQUE,
    chat_history TEXT NOT NULL DEFAULT '[]',     -- JSON array of {role, content}
    symptoms TEXT,
    duration TEXT,
    age INTEGER,
    medical_history TEXT,
    recommended_doctors TEXT,                    -- JSON array of {doctorId, reason}, NULL when none
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
