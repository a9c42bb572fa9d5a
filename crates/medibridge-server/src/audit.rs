//! JSON report for the directory data-quality audit.

use serde::Serialize;

use medibridge_core::{AuditIssue, CoreResult, MediBridgeCore};

/// Audit output as printed by `medibridge-audit`.
#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub issue_count: usize,
    pub issues: Vec<AuditIssue>,
}

impl AuditReport {
    pub fn collect(core: &MediBridgeCore) -> CoreResult<Self> {
        let issues = core.audit()?;
        Ok(Self {
            issue_count: issues.len(),
            issues,
        })
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medibridge_core::DirectorySeed;

    fn core_with(doctors: &str) -> MediBridgeCore {
        let core = MediBridgeCore::open_in_memory().unwrap();
        let seed = DirectorySeed::from_json(&format!(
            r#"{{"hospitals": [{{"name": "华山医院", "departments": [{{"name": "神经内科", "doctors": {doctors}}}]}}]}}"#
        ))
        .unwrap();
        core.seed_if_empty(&seed).unwrap();
        core
    }

    #[test]
    fn test_clean_directory_report() {
        let report = AuditReport::collect(&core_with(r#"[{"name": "王芳", "expertise": "头痛"}]"#)).unwrap();
        assert!(report.is_clean());

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["issue_count"], 0);
        assert_eq!(value["issues"], serde_json::json!([]));
    }

    #[test]
    fn test_report_lists_tagged_issues() {
        let core = core_with(r#"[{"name": "王芳", "expertise": "头痛"}, {"name": "赵敏"}]"#);
        let report = AuditReport::collect(&core).unwrap();
        assert!(!report.is_clean());

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["issue_count"], 1);
        assert_eq!(value["issues"][0]["type"], "missing_expertise");
        assert!(value["issues"][0]["doctor_id"].is_i64());
    }
}
