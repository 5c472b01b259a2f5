use std::sync::Arc;

use shared::{
    domain::{ApplicationId, ApplicationStatus, Education, JobId},
    protocol::Application,
};

use super::Backend;
use crate::{error::OperationError, resource::AsyncResource};

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// The applicant looking at their own application.
    Candidate,
    /// The job owner reviewing applicants.
    Recruiter,
}

pub struct ApplicationCard {
    application: Application,
    audience: Audience,
    status: AsyncResource<(JobId, ApplicationId), ApplicationStatus, Vec<Application>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusControl {
    ReadOnly(ApplicationStatus),
    Select {
        current: ApplicationStatus,
        options: [ApplicationStatus; 4],
        updating: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationCardRender {
    pub title: String,
    pub experience: String,
    pub education: Education,
    pub skills: String,
    pub resume_url: String,
    pub created_at: Option<String>,
    pub status: StatusControl,
    pub error: Option<String>,
}

impl ApplicationCard {
    pub fn new(backend: &Backend, application: Application, audience: Audience) -> Self {
        let backend = Arc::clone(backend);
        let status = AsyncResource::with_bound(
            "update_application_status",
            (application.job_id, application.id),
            move |(job_id, application_id), status| {
                let backend = Arc::clone(&backend);
                async move {
                    backend
                        .update_application_status(job_id, application_id, status)
                        .await
                }
            },
        );
        Self {
            application,
            audience,
            status,
        }
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    /// Latest committed status, falling back to the row as fetched.
    pub fn current_status(&self) -> ApplicationStatus {
        self.status
            .data()
            .and_then(|rows| rows.first().map(|row| row.status))
            .unwrap_or(self.application.status)
    }

    pub async fn set_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<Application>, OperationError> {
        match self.audience {
            Audience::Recruiter => self.status.trigger(status).await,
            Audience::Candidate => Err(OperationError::new(
                "Only the recruiter can change an application status",
            )),
        }
    }

    pub fn render(&self) -> ApplicationCardRender {
        let application = &self.application;
        let title = match self.audience {
            Audience::Candidate => match &application.job {
                Some(job) => match &job.company {
                    Some(company) => format!("{} at {}", job.title, company.name),
                    None => job.title.clone(),
                },
                None => format!("Job #{}", application.job_id),
            },
            Audience::Recruiter => application.name.clone(),
        };
        let status = match self.audience {
            Audience::Candidate => StatusControl::ReadOnly(self.current_status()),
            Audience::Recruiter => StatusControl::Select {
                current: self.current_status(),
                options: ApplicationStatus::ALL,
                updating: self.status.is_loading(),
            },
        };

        ApplicationCardRender {
            title,
            experience: format!("{} years of experience", application.experience),
            education: application.education,
            skills: application.skills.clone(),
            resume_url: application.resume.clone(),
            created_at: application
                .created_at
                .map(|at| at.format(CREATED_AT_FORMAT).to_string()),
            status,
            error: self.status.error().map(|error| error.message().to_string()),
        }
    }
}
