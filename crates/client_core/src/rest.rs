//! `JobBoardBackend` over a PostgREST data API and its companion object store.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use shared::{
    domain::{ApplicationId, ApplicationStatus, JobId, UserId},
    error::ApiException,
    protocol::{
        Application, ApplicationInsert, Company, CompanyInsert, FileUpload, Job, JobFilter,
        NewApplication, NewCompany, NewJob, SaveJobRequest, SavedJob,
    },
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::JobBoardBackend;

const JOB_LIST_SELECT: &str = "*,company:companies(name,logo_url),saved:saved_jobs(id)";
const JOB_DETAIL_SELECT: &str = "*,company:companies(name,logo_url),applications:applications(*)";
const MY_JOBS_SELECT: &str = "*,company:companies(name,logo_url)";
const SAVED_JOBS_SELECT: &str = "*,job:jobs(*,company:companies(name,logo_url))";
const APPLICATIONS_SELECT: &str = "*,job:jobs(title,company:companies(name))";
const RESUME_BUCKET: &str = "resumes";
const LOGO_BUCKET: &str = "company-logo";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const DEFAULT_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct RestConfig {
    pub backend_url: String,
    pub api_key: String,
    pub access_token: Option<String>,
    pub request_timeout: Option<Duration>,
}

pub struct RestBackend {
    http: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestBackend {
    pub fn new(config: RestConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            access_token: config.access_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn public_object_url(&self, bucket: &str, object: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{object}", self.base_url)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, self.table_url(table))
    }

    /// Insert/update/delete that echoes the affected rows.
    fn mutation(&self, method: Method, table: &str) -> RequestBuilder {
        self.table(method, table)
            .header("Prefer", "return=representation")
    }

    async fn rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        decode(response).await
    }

    async fn insert<B, T>(&self, table: &str, body: &B) -> Result<Vec<T>>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.rows(self.mutation(Method::POST, table).json(body))
            .await
    }

    async fn upload(&self, bucket: &str, object: &str, file: &FileUpload) -> Result<String> {
        let mime = file.mime_type.as_deref().unwrap_or(DEFAULT_MIME);
        let url = format!("{}/storage/v1/object/{bucket}/{object}", self.base_url);
        let response = self
            .request(Method::POST, url)
            .header(header::CONTENT_TYPE, mime)
            .header("x-upsert", "false")
            .body(file.bytes.clone())
            .send()
            .await?;
        ensure_success(response).await?;
        info!(bucket, object, size_bytes = file.bytes.len(), "uploaded object");
        Ok(self.public_object_url(bucket, object))
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiException::from_response(status.as_u16(), &body).into())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    Ok(response.json().await?)
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Object names only keep characters that are safe in a storage path.
fn object_safe(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn job_filter_query(filter: &JobFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![("select", JOB_LIST_SELECT.to_string())];
    if let Some(location) = filter.location.as_deref().filter(|v| !v.is_empty()) {
        query.push(("location", eq(location)));
    }
    if let Some(company_id) = filter.company_id {
        query.push(("company_id", eq(company_id)));
    }
    if let Some(search) = filter.search_query.as_deref().filter(|v| !v.is_empty()) {
        query.push(("title", format!("ilike.*{search}*")));
    }
    query
}

#[async_trait]
impl JobBoardBackend for RestBackend {
    async fn get_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        debug!(?filter, "fetching jobs");
        self.rows(self.table(Method::GET, "jobs").query(&job_filter_query(filter)))
            .await
            .context("failed to fetch jobs")
    }

    async fn get_single_job(&self, job_id: JobId) -> Result<Job> {
        self.rows(
            self.table(Method::GET, "jobs")
                .header(header::ACCEPT, SINGLE_OBJECT)
                .query(&[("select", JOB_DETAIL_SELECT.to_string()), ("id", eq(job_id))]),
        )
        .await
        .with_context(|| format!("failed to fetch job {job_id}"))
    }

    async fn get_saved_jobs(&self, user_id: &UserId) -> Result<Vec<SavedJob>> {
        self.rows(
            self.table(Method::GET, "saved_jobs")
                .query(&[("select", SAVED_JOBS_SELECT.to_string()), ("user_id", eq(user_id))]),
        )
        .await
        .context("failed to fetch saved jobs")
    }

    async fn save_job(
        &self,
        already_saved: bool,
        request: &SaveJobRequest,
    ) -> Result<Vec<SavedJob>> {
        if already_saved {
            let response = self
                .table(Method::DELETE, "saved_jobs")
                .query(&[
                    ("job_id", eq(request.job_id)),
                    ("user_id", eq(&request.user_id)),
                ])
                .send()
                .await?;
            ensure_success(response)
                .await
                .context("failed to remove saved job")?;
            debug!(job_id = %request.job_id, "job unsaved");
            return Ok(Vec::new());
        }

        self.insert("saved_jobs", std::slice::from_ref(request))
            .await
            .context("failed to save job")
    }

    async fn delete_job(&self, job_id: JobId) -> Result<Vec<Job>> {
        self.rows(
            self.mutation(Method::DELETE, "jobs")
                .query(&[("id", eq(job_id))]),
        )
        .await
        .with_context(|| format!("failed to delete job {job_id}"))
    }

    async fn add_new_job(&self, job: &NewJob) -> Result<Vec<Job>> {
        self.insert("jobs", std::slice::from_ref(job))
            .await
            .context("failed to create job")
    }

    async fn update_hiring_status(&self, job_id: JobId, is_open: bool) -> Result<Vec<Job>> {
        self.rows(
            self.mutation(Method::PATCH, "jobs")
                .query(&[("id", eq(job_id))])
                .json(&json!({ "isOpen": is_open })),
        )
        .await
        .with_context(|| format!("failed to update hiring status for job {job_id}"))
    }

    async fn get_my_jobs(&self, recruiter_id: &UserId) -> Result<Vec<Job>> {
        self.rows(self.table(Method::GET, "jobs").query(&[
            ("select", MY_JOBS_SELECT.to_string()),
            ("recruiter_id", eq(recruiter_id)),
        ]))
        .await
        .context("failed to fetch recruiter jobs")
    }

    async fn get_companies(&self) -> Result<Vec<Company>> {
        self.rows(self.table(Method::GET, "companies").query(&[("select", "*")]))
            .await
            .context("failed to fetch companies")
    }

    async fn add_new_company(&self, company: &NewCompany) -> Result<Vec<Company>> {
        let object = format!("logo-{}-{}", Uuid::new_v4(), object_safe(&company.name));
        let logo_url = self
            .upload(LOGO_BUCKET, &object, &company.logo)
            .await
            .context("failed to upload company logo")?;
        self.insert(
            "companies",
            &[CompanyInsert {
                name: &company.name,
                logo_url: &logo_url,
            }],
        )
        .await
        .context("failed to create company")
    }

    async fn apply_to_job(&self, application: &NewApplication) -> Result<Vec<Application>> {
        let object = format!(
            "resume-{}-{}",
            Uuid::new_v4(),
            object_safe(application.candidate_id.as_str())
        );
        let resume_url = self
            .upload(RESUME_BUCKET, &object, &application.resume)
            .await
            .context("failed to upload resume")?;
        self.insert(
            "applications",
            &[ApplicationInsert {
                job_id: application.job_id,
                candidate_id: &application.candidate_id,
                name: &application.name,
                status: application.status,
                experience: application.experience,
                skills: &application.skills,
                education: application.education,
                resume: &resume_url,
            }],
        )
        .await
        .context("failed to submit application")
    }

    async fn update_application_status(
        &self,
        job_id: JobId,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Vec<Application>> {
        self.rows(
            self.mutation(Method::PATCH, "applications")
                .query(&[("id", eq(application_id)), ("job_id", eq(job_id))])
                .json(&json!({ "status": status })),
        )
        .await
        .with_context(|| format!("failed to update application {application_id}"))
    }

    async fn get_applications(&self, user_id: &UserId) -> Result<Vec<Application>> {
        self.rows(self.table(Method::GET, "applications").query(&[
            ("select", APPLICATIONS_SELECT.to_string()),
            ("candidate_id", eq(user_id)),
        ]))
        .await
        .context("failed to fetch applications")
    }
}

#[cfg(test)]
#[path = "tests/rest_tests.rs"]
mod tests;
