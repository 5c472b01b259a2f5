use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ApplicationId, ApplicationStatus, CompanyId, Education, JobId, SavedJobId, UserId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Company projection embedded in job rows (`company:companies(name,logo_url)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMarker {
    pub id: SavedJobId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub company_id: CompanyId,
    pub recruiter_id: UserId,
    #[serde(default)]
    pub requirements: String,
    #[serde(rename = "isOpen")]
    pub is_open: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<Application>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub saved: Vec<SavedMarker>,
}

/// Job projection embedded in application rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRef {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub candidate_id: UserId,
    pub name: String,
    pub status: ApplicationStatus,
    pub experience: u32,
    pub skills: String,
    pub education: Education,
    pub resume: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedJob {
    pub id: SavedJobId,
    pub user_id: UserId,
    pub job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl JobFilter {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.company_id.is_none() && self.search_query.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub company_id: CompanyId,
    pub requirements: String,
    pub recruiter_id: UserId,
    #[serde(rename = "isOpen")]
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveJobRequest {
    pub user_id: UserId,
    pub job_id: JobId,
}

/// Raw file handed to the object store (resume, company logo).
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCompany {
    pub name: String,
    pub logo: FileUpload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub job_id: JobId,
    pub candidate_id: UserId,
    pub name: String,
    pub status: ApplicationStatus,
    pub experience: u32,
    pub skills: String,
    pub education: Education,
    pub resume: FileUpload,
}

/// Insert body for `applications` once the resume has been stored.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationInsert<'a> {
    pub job_id: JobId,
    pub candidate_id: &'a UserId,
    pub name: &'a str,
    pub status: ApplicationStatus,
    pub experience: u32,
    pub skills: &'a str,
    pub education: Education,
    pub resume: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyInsert<'a> {
    pub name: &'a str,
    pub logo_url: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_row_uses_camel_case_open_flag_and_optional_embeds() {
        let raw = r#"{
            "id": 3,
            "title": "Backend Engineer",
            "description": "Build APIs. Ship often.",
            "location": "Karnataka",
            "company_id": 2,
            "recruiter_id": "user_r1",
            "requirements": "- Rust\n- SQL",
            "isOpen": true,
            "company": {"name": "Acme", "logo_url": "https://cdn/acme.png"},
            "saved": [{"id": 9}]
        }"#;
        let job: Job = serde_json::from_str(raw).expect("job");
        assert!(job.is_open);
        assert_eq!(job.company.as_ref().map(|c| c.name.as_str()), Some("Acme"));
        assert_eq!(job.saved.len(), 1);
        assert!(job.applications.is_empty());

        let back = serde_json::to_value(&job).expect("serialize");
        assert_eq!(back["isOpen"], serde_json::json!(true));
        assert!(back.get("applications").is_none());
    }

    #[test]
    fn empty_filter_reports_empty() {
        assert!(JobFilter::default().is_empty());
        let filter = JobFilter {
            location: Some("Goa".into()),
            ..JobFilter::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn upload_debug_omits_bytes() {
        let upload = FileUpload {
            filename: "cv.pdf".into(),
            mime_type: Some("application/pdf".into()),
            bytes: vec![1, 2, 3],
        };
        let rendered = format!("{upload:?}");
        assert!(rendered.contains("size_bytes: 3"));
        assert!(!rendered.contains("[1, 2, 3]"));
    }
}
