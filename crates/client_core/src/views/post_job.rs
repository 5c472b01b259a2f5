use std::sync::Arc;

use shared::{
    domain::Role,
    protocol::{Company, Job, NewCompany, NewJob},
};
use tracing::info;

use super::{Backend, Route, Submission, Viewer};
use crate::{
    forms::{CompanyField, CompanyForm, PostJobField, PostJobForm},
    resource::{AsyncResource, AsyncState, Trigger},
};

/// Recruiter-only page for posting a job, with the add-company drawer.
pub struct PostJobPage {
    companies: AsyncResource<(), (), Vec<Company>>,
    create: AsyncResource<(), NewJob, Vec<Job>>,
    add_company: AsyncResource<(), NewCompany, Vec<Company>>,
}

impl PostJobPage {
    pub fn new(backend: Backend) -> Self {
        let companies_backend = Arc::clone(&backend);
        let companies = AsyncResource::new("get_companies", move |()| {
            let backend = Arc::clone(&companies_backend);
            async move { backend.get_companies().await }
        });

        let create_backend = Arc::clone(&backend);
        let create = AsyncResource::new("add_new_job", move |job: NewJob| {
            let backend = Arc::clone(&create_backend);
            async move { backend.add_new_job(&job).await }
        });

        let add_company = AsyncResource::new("add_new_company", move |company: NewCompany| {
            let backend = Arc::clone(&backend);
            async move { backend.add_new_company(&company).await }
        });

        Self {
            companies,
            create,
            add_company,
        }
    }

    /// Where a viewer who may not post jobs is sent instead.
    pub fn redirect_for(viewer: &Viewer) -> Option<Route> {
        match viewer.role {
            Some(Role::Recruiter) => None,
            Some(Role::Candidate) => Some(Route::Jobs),
            None => Some(Route::Onboarding),
        }
    }

    pub fn load(&self) -> Trigger<Vec<Company>> {
        self.companies.trigger(())
    }

    pub fn companies(&self) -> AsyncState<Vec<Company>> {
        self.companies.state()
    }

    pub fn is_creating(&self) -> bool {
        self.create.is_loading()
    }

    pub async fn submit(&self, viewer: &Viewer, form: &PostJobForm) -> Submission<PostJobField> {
        if let Some(route) = Self::redirect_for(viewer) {
            return Submission::Redirect(route);
        }
        let valid = match form.validate() {
            Ok(valid) => valid,
            Err(errors) => return Submission::Invalid(errors),
        };

        let job = NewJob {
            title: valid.title,
            description: valid.description,
            location: valid.location,
            company_id: valid.company_id,
            requirements: valid.requirements,
            recruiter_id: viewer.user_id.clone(),
            is_open: true,
        };
        match self.create.trigger(job).await {
            Ok(rows) if rows.is_empty() => Submission::Accepted { navigate: None },
            Ok(rows) => {
                info!(job_ids = ?rows.iter().map(|job| job.id).collect::<Vec<_>>(), "job posted");
                Submission::Accepted {
                    navigate: Some(Route::Jobs),
                }
            }
            Err(error) => Submission::Failed(error),
        }
    }

    /// Adds a company; the company list is refreshed when a row came back.
    pub async fn add_company(
        &self,
        viewer: &Viewer,
        form: &CompanyForm,
    ) -> Submission<CompanyField> {
        if let Some(route) = Self::redirect_for(viewer) {
            return Submission::Redirect(route);
        }
        let company = match form.validate() {
            Ok(company) => company,
            Err(errors) => return Submission::Invalid(errors),
        };

        match self.add_company.trigger(company).await {
            Ok(rows) => {
                if !rows.is_empty() {
                    if let Err(error) = self.load().await {
                        return Submission::Failed(error);
                    }
                }
                Submission::Accepted { navigate: None }
            }
            Err(error) => Submission::Failed(error),
        }
    }
}
