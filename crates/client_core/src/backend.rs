//! Remote operations against the job-board data store.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{ApplicationId, ApplicationStatus, JobId, UserId},
    protocol::{
        Application, Company, Job, JobFilter, NewApplication, NewCompany, NewJob, SaveJobRequest,
        SavedJob,
    },
};

#[async_trait]
pub trait JobBoardBackend: Send + Sync {
    async fn get_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>>;
    async fn get_single_job(&self, job_id: JobId) -> Result<Job>;
    async fn get_saved_jobs(&self, user_id: &UserId) -> Result<Vec<SavedJob>>;
    /// Deletes the saved row when `already_saved`, otherwise inserts it.
    /// Returns the rows that are saved after the call (empty after an unsave).
    async fn save_job(&self, already_saved: bool, request: &SaveJobRequest)
        -> Result<Vec<SavedJob>>;
    async fn delete_job(&self, job_id: JobId) -> Result<Vec<Job>>;
    async fn add_new_job(&self, job: &NewJob) -> Result<Vec<Job>>;
    async fn update_hiring_status(&self, job_id: JobId, is_open: bool) -> Result<Vec<Job>>;
    async fn get_my_jobs(&self, recruiter_id: &UserId) -> Result<Vec<Job>>;
    async fn get_companies(&self) -> Result<Vec<Company>>;
    async fn add_new_company(&self, company: &NewCompany) -> Result<Vec<Company>>;
    async fn apply_to_job(&self, application: &NewApplication) -> Result<Vec<Application>>;
    async fn update_application_status(
        &self,
        job_id: JobId,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Vec<Application>>;
    async fn get_applications(&self, user_id: &UserId) -> Result<Vec<Application>>;
}

/// Backend used before a session is configured; every call fails.
pub struct MissingBackend;

fn unavailable<T>(operation: &str) -> Result<T> {
    Err(anyhow!(
        "job board backend unavailable for {operation}; configure backend_url"
    ))
}

#[async_trait]
impl JobBoardBackend for MissingBackend {
    async fn get_jobs(&self, _filter: &JobFilter) -> Result<Vec<Job>> {
        unavailable("get_jobs")
    }

    async fn get_single_job(&self, _job_id: JobId) -> Result<Job> {
        unavailable("get_single_job")
    }

    async fn get_saved_jobs(&self, _user_id: &UserId) -> Result<Vec<SavedJob>> {
        unavailable("get_saved_jobs")
    }

    async fn save_job(
        &self,
        _already_saved: bool,
        _request: &SaveJobRequest,
    ) -> Result<Vec<SavedJob>> {
        unavailable("save_job")
    }

    async fn delete_job(&self, _job_id: JobId) -> Result<Vec<Job>> {
        unavailable("delete_job")
    }

    async fn add_new_job(&self, _job: &NewJob) -> Result<Vec<Job>> {
        unavailable("add_new_job")
    }

    async fn update_hiring_status(&self, _job_id: JobId, _is_open: bool) -> Result<Vec<Job>> {
        unavailable("update_hiring_status")
    }

    async fn get_my_jobs(&self, _recruiter_id: &UserId) -> Result<Vec<Job>> {
        unavailable("get_my_jobs")
    }

    async fn get_companies(&self) -> Result<Vec<Company>> {
        unavailable("get_companies")
    }

    async fn add_new_company(&self, _company: &NewCompany) -> Result<Vec<Company>> {
        unavailable("add_new_company")
    }

    async fn apply_to_job(&self, _application: &NewApplication) -> Result<Vec<Application>> {
        unavailable("apply_to_job")
    }

    async fn update_application_status(
        &self,
        _job_id: JobId,
        _application_id: ApplicationId,
        _status: ApplicationStatus,
    ) -> Result<Vec<Application>> {
        unavailable("update_application_status")
    }

    async fn get_applications(&self, _user_id: &UserId) -> Result<Vec<Application>> {
        unavailable("get_applications")
    }
}
