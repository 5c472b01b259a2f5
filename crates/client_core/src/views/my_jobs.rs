//! "My Jobs": a candidate's applications or a recruiter's postings.

use std::sync::Arc;

use shared::{
    domain::{Role, UserId},
    protocol::{Application, Job},
};

use super::{
    application_card::{ApplicationCard, Audience},
    job_card::JobCard,
    list_render, Backend, ListRender, Viewer,
};
use crate::{error::OperationError, resource::AsyncResource};

pub enum MyJobsPage {
    Applications(CandidateApplications),
    Jobs(RecruiterJobs),
    NeedsOnboarding,
}

impl MyJobsPage {
    pub fn for_viewer(backend: Backend, viewer: &Viewer) -> Self {
        match viewer.role {
            Some(Role::Candidate) => {
                MyJobsPage::Applications(CandidateApplications::new(backend, viewer.user_id.clone()))
            }
            Some(Role::Recruiter) => MyJobsPage::Jobs(RecruiterJobs::new(backend, viewer.clone())),
            None => MyJobsPage::NeedsOnboarding,
        }
    }

    pub fn title(&self) -> Option<&'static str> {
        match self {
            MyJobsPage::Applications(_) => Some("My Applications"),
            MyJobsPage::Jobs(_) => Some("My Jobs"),
            MyJobsPage::NeedsOnboarding => None,
        }
    }

    pub async fn load(&self) -> Result<(), OperationError> {
        match self {
            MyJobsPage::Applications(page) => page.load().await.map(drop),
            MyJobsPage::Jobs(page) => page.load().await.map(drop),
            MyJobsPage::NeedsOnboarding => Ok(()),
        }
    }
}

pub struct CandidateApplications {
    backend: Backend,
    applications: AsyncResource<UserId, (), Vec<Application>>,
}

impl CandidateApplications {
    fn new(backend: Backend, user_id: UserId) -> Self {
        let applications_backend = Arc::clone(&backend);
        let applications = AsyncResource::with_bound(
            "get_applications",
            user_id,
            move |user_id: UserId, ()| {
                let backend = Arc::clone(&applications_backend);
                async move { backend.get_applications(&user_id).await }
            },
        );
        Self {
            backend,
            applications,
        }
    }

    pub async fn load(&self) -> Result<Vec<Application>, OperationError> {
        self.applications.trigger(()).await
    }

    pub fn render(&self) -> ListRender<ApplicationCard> {
        self.applications.with_state(|state| {
            list_render(state, "No Applications Found", |application| {
                Some(ApplicationCard::new(
                    &self.backend,
                    application.clone(),
                    Audience::Candidate,
                ))
            })
        })
    }
}

pub struct RecruiterJobs {
    backend: Backend,
    viewer: Viewer,
    jobs: AsyncResource<UserId, (), Vec<Job>>,
}

impl RecruiterJobs {
    fn new(backend: Backend, viewer: Viewer) -> Self {
        let jobs_backend = Arc::clone(&backend);
        let jobs = AsyncResource::with_bound(
            "get_my_jobs",
            viewer.user_id.clone(),
            move |recruiter_id: UserId, ()| {
                let backend = Arc::clone(&jobs_backend);
                async move { backend.get_my_jobs(&recruiter_id).await }
            },
        );
        Self {
            backend,
            viewer,
            jobs,
        }
    }

    pub async fn load(&self) -> Result<Vec<Job>, OperationError> {
        self.jobs.trigger(()).await
    }

    /// Deletes through the card and refreshes the list.
    pub async fn delete_job(&self, card: &JobCard) -> Result<Vec<Job>, OperationError> {
        let deleted = card.delete().await?;
        self.load().await?;
        Ok(deleted)
    }

    pub fn render(&self) -> ListRender<JobCard> {
        self.jobs.with_state(|state| {
            list_render(state, "No Jobs Found", |job| {
                Some(JobCard::new(
                    &self.backend,
                    job.clone(),
                    Some(&self.viewer),
                    !job.saved.is_empty(),
                ))
            })
        })
    }
}
