//! Single job page: details, owner controls and the apply flow.

use std::sync::Arc;

use shared::{
    domain::{ApplicationStatus, HiringStatus, JobId, Role},
    protocol::{Application, Job, NewApplication},
};
use tracing::warn;

use super::{
    application_card::{ApplicationCard, Audience},
    Backend, Ownership, Route, Submission, Viewer,
};
use crate::{
    error::OperationError,
    forms::{ApplyField, ApplyForm},
    resource::{AsyncResource, Phase, Trigger},
};

pub struct JobPage {
    backend: Backend,
    job: AsyncResource<JobId, (), Job>,
    hiring: AsyncResource<JobId, bool, Vec<Job>>,
    apply: AsyncResource<(), NewApplication, Vec<Application>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyButton {
    Apply,
    Applied,
    HiringClosed,
}

impl ApplyButton {
    pub fn label(self) -> &'static str {
        match self {
            ApplyButton::Apply => "Apply",
            ApplyButton::Applied => "Applied",
            ApplyButton::HiringClosed => "Hiring Closed",
        }
    }
}

pub enum ViewerPanel {
    Owner {
        status_placeholder: String,
        applications: Vec<ApplicationCard>,
    },
    Visitor {
        button: ApplyButton,
        enabled: bool,
    },
}

pub struct JobDetails {
    pub title: String,
    pub company_name: Option<String>,
    pub logo_url: Option<String>,
    pub location: String,
    pub applicants: String,
    pub hiring: HiringStatus,
    pub description: String,
    pub requirements: Vec<String>,
    pub busy: bool,
    pub panel: ViewerPanel,
}

pub enum JobPageRender {
    Loading,
    Failed(String),
    Ready(Box<JobDetails>),
}

impl JobPage {
    pub fn new(backend: Backend, job_id: JobId) -> Self {
        let job_backend = Arc::clone(&backend);
        let job = AsyncResource::with_bound("get_single_job", job_id, move |job_id, ()| {
            let backend = Arc::clone(&job_backend);
            async move { backend.get_single_job(job_id).await }
        });

        let hiring_backend = Arc::clone(&backend);
        let hiring =
            AsyncResource::with_bound("update_hiring_status", job_id, move |job_id, is_open| {
                let backend = Arc::clone(&hiring_backend);
                async move { backend.update_hiring_status(job_id, is_open).await }
            });

        let apply_backend = Arc::clone(&backend);
        let apply = AsyncResource::new("apply_to_job", move |application: NewApplication| {
            let backend = Arc::clone(&apply_backend);
            async move { backend.apply_to_job(&application).await }
        });

        Self {
            backend,
            job,
            hiring,
            apply,
        }
    }

    pub fn job_id(&self) -> JobId {
        *self.job.bound()
    }

    pub fn load(&self) -> Trigger<Job> {
        self.job.trigger(())
    }

    pub fn job(&self) -> Option<Job> {
        self.job.data()
    }

    /// Owner-only. Re-fetches the job once the update settles successfully.
    pub async fn set_hiring_status(
        &self,
        viewer: &Viewer,
        status: HiringStatus,
    ) -> Result<Vec<Job>, OperationError> {
        let job = self
            .job
            .data()
            .ok_or_else(|| OperationError::new("Job is still loading"))?;
        if Ownership::of(Some(viewer), &job) != Ownership::Owner {
            return Err(OperationError::new(
                "Only the recruiter who posted this job can change its hiring status",
            ));
        }

        let updated = self.hiring.trigger(status.is_open()).await?;
        self.load().await?;
        Ok(updated)
    }

    pub async fn apply(&self, viewer: &Viewer, form: &mut ApplyForm) -> Submission<ApplyField> {
        match viewer.role {
            None => return Submission::Redirect(Route::Onboarding),
            Some(Role::Candidate) | Some(Role::Recruiter) => {}
        }
        let valid = match form.validate() {
            Ok(valid) => valid,
            Err(errors) => return Submission::Invalid(errors),
        };
        let Some(job) = self.job.data() else {
            return Submission::Blocked("Job is still loading");
        };
        if Ownership::of(Some(viewer), &job) == Ownership::Owner {
            return Submission::Blocked("You cannot apply to your own job");
        }
        match apply_button(&job, viewer) {
            ApplyButton::Apply => {}
            blocked => return Submission::Blocked(blocked.label()),
        }

        let application = NewApplication {
            job_id: job.id,
            candidate_id: viewer.user_id.clone(),
            name: viewer.full_name.clone(),
            status: ApplicationStatus::Applied,
            experience: valid.experience,
            skills: valid.skills,
            education: valid.education,
            resume: valid.resume,
        };
        match self.apply.trigger(application).await {
            Ok(_) => {
                *form = ApplyForm::default();
                if let Err(error) = self.load().await {
                    warn!(job_id = %job.id, %error, "failed to refresh job after applying");
                }
                Submission::Accepted { navigate: None }
            }
            Err(error) => Submission::Failed(error),
        }
    }

    pub fn apply_error(&self) -> Option<OperationError> {
        self.apply.error()
    }

    pub fn render(&self, viewer: Option<&Viewer>) -> JobPageRender {
        let state = self.job.state();
        let job = match state.phase() {
            Phase::Idle | Phase::Loading => return JobPageRender::Loading,
            Phase::Failed(error) => return JobPageRender::Failed(error.message().to_string()),
            Phase::Ready(job) => job,
        };

        let hiring = HiringStatus::from_is_open(job.is_open);
        let panel = match Ownership::of(viewer, job) {
            Ownership::Owner => ViewerPanel::Owner {
                status_placeholder: format!("Hiring Status ({})", hiring.label()),
                applications: job
                    .applications
                    .iter()
                    .map(|application| {
                        ApplicationCard::new(&self.backend, application.clone(), Audience::Recruiter)
                    })
                    .collect(),
            },
            Ownership::Visitor => {
                let button = match viewer {
                    Some(viewer) => apply_button(job, viewer),
                    None => closed_or_apply(job),
                };
                ViewerPanel::Visitor {
                    button,
                    enabled: button == ApplyButton::Apply,
                }
            }
        };

        let company = job.company.as_ref();
        JobPageRender::Ready(Box::new(JobDetails {
            title: job.title.clone(),
            company_name: company.map(|c| c.name.clone()),
            logo_url: company.and_then(|c| c.logo_url.clone()),
            location: job.location.clone(),
            applicants: applicant_label(job.applications.len()),
            hiring,
            description: job.description.clone(),
            requirements: requirement_lines(&job.requirements),
            busy: self.hiring.is_loading() || self.apply.is_loading(),
            panel,
        }))
    }
}

fn closed_or_apply(job: &Job) -> ApplyButton {
    if job.is_open {
        ApplyButton::Apply
    } else {
        ApplyButton::HiringClosed
    }
}

fn apply_button(job: &Job, viewer: &Viewer) -> ApplyButton {
    let applied = job
        .applications
        .iter()
        .any(|application| application.candidate_id == viewer.user_id);
    match closed_or_apply(job) {
        ApplyButton::HiringClosed => ApplyButton::HiringClosed,
        _ if applied => ApplyButton::Applied,
        open => open,
    }
}

pub fn applicant_label(count: usize) -> String {
    if count == 1 {
        "1 Applicant".to_string()
    } else {
        format!("{count} Applicants")
    }
}

/// Requirement bullets, one per non-blank line, with any leading `-` removed.
pub fn requirement_lines(requirements: &str) -> Vec<String> {
    requirements
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('-').map_or(line, str::trim_start)
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
