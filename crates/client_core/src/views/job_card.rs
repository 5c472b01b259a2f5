use std::sync::Arc;

use shared::{
    domain::JobId,
    protocol::{Job, SaveJobRequest, SavedJob},
};

use super::{Backend, Ownership, Viewer};
use crate::{error::OperationError, resource::AsyncResource};

/// Arguments for one save/unsave call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveToggle {
    pub already_saved: bool,
    pub request: SaveJobRequest,
}

/// Summary card for a job in a list, with its own save and delete controllers.
pub struct JobCard {
    job: Job,
    viewer: Option<Viewer>,
    ownership: Ownership,
    saved: bool,
    save: AsyncResource<(), SaveToggle, Vec<SavedJob>>,
    delete: AsyncResource<JobId, (), Vec<Job>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCardRender {
    pub id: JobId,
    pub title: String,
    pub company_name: Option<String>,
    pub logo_url: Option<String>,
    pub location: String,
    pub excerpt: String,
    pub saved: bool,
    pub show_save: bool,
    pub show_delete: bool,
    pub saving: bool,
    pub deleting: bool,
}

impl JobCard {
    pub fn new(backend: &Backend, job: Job, viewer: Option<&Viewer>, saved_init: bool) -> Self {
        let save_backend = Arc::clone(backend);
        let save = AsyncResource::new("save_job", move |toggle: SaveToggle| {
            let backend = Arc::clone(&save_backend);
            async move { backend.save_job(toggle.already_saved, &toggle.request).await }
        });

        let delete_backend = Arc::clone(backend);
        let delete = AsyncResource::with_bound("delete_job", job.id, move |job_id, ()| {
            let backend = Arc::clone(&delete_backend);
            async move { backend.delete_job(job_id).await }
        });

        Self {
            ownership: Ownership::of(viewer, &job),
            viewer: viewer.cloned(),
            job,
            saved: saved_init,
            save,
            delete,
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn saved(&self) -> bool {
        self.saved
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Saves or unsaves the job; `saved` follows whether rows came back.
    pub async fn toggle_save(&mut self) -> Result<bool, OperationError> {
        let viewer = self
            .viewer
            .as_ref()
            .ok_or_else(|| OperationError::new("Sign in to save jobs"))?;
        let rows = self
            .save
            .trigger(SaveToggle {
                already_saved: self.saved,
                request: SaveJobRequest {
                    user_id: viewer.user_id.clone(),
                    job_id: self.job.id,
                },
            })
            .await?;
        self.saved = !rows.is_empty();
        Ok(self.saved)
    }

    pub async fn delete(&self) -> Result<Vec<Job>, OperationError> {
        if self.ownership != Ownership::Owner {
            return Err(OperationError::new(
                "Only the recruiter who posted this job can delete it",
            ));
        }
        self.delete.trigger(()).await
    }

    pub fn render(&self) -> JobCardRender {
        let company = self.job.company.as_ref();
        let is_owner = self.ownership == Ownership::Owner;
        JobCardRender {
            id: self.job.id,
            title: self.job.title.clone(),
            company_name: company.map(|c| c.name.clone()),
            logo_url: company.and_then(|c| c.logo_url.clone()),
            location: self.job.location.clone(),
            excerpt: description_excerpt(&self.job.description).to_string(),
            saved: self.saved,
            show_save: !is_owner && self.viewer.is_some(),
            show_delete: is_owner,
            saving: self.save.is_loading(),
            deleting: self.delete.is_loading(),
        }
    }
}

/// First sentence of a description, without the period. Empty when the text
/// has no period.
pub fn description_excerpt(description: &str) -> &str {
    description
        .find('.')
        .map(|end| &description[..end])
        .unwrap_or("")
}
