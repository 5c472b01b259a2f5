use std::sync::Arc;

use shared::{domain::UserId, protocol::SavedJob};

use super::{job_card::JobCard, list_render, Backend, ListRender, Viewer};
use crate::{
    error::OperationError,
    resource::{AsyncResource, Trigger},
};

pub struct SavedJobsPage {
    backend: Backend,
    viewer: Viewer,
    saved: AsyncResource<UserId, (), Vec<SavedJob>>,
}

impl SavedJobsPage {
    pub fn new(backend: Backend, viewer: Viewer) -> Self {
        let saved_backend = Arc::clone(&backend);
        let saved = AsyncResource::with_bound(
            "get_saved_jobs",
            viewer.user_id.clone(),
            move |user_id: UserId, ()| {
                let backend = Arc::clone(&saved_backend);
                async move { backend.get_saved_jobs(&user_id).await }
            },
        );
        Self {
            backend,
            viewer,
            saved,
        }
    }

    pub fn load(&self) -> Trigger<Vec<SavedJob>> {
        self.saved.trigger(())
    }

    /// Toggles a card and then refreshes the saved list.
    pub async fn toggle_save(&self, card: &mut JobCard) -> Result<bool, OperationError> {
        let saved = card.toggle_save().await?;
        self.load().await?;
        Ok(saved)
    }

    pub fn render(&self) -> ListRender<JobCard> {
        self.saved.with_state(|state| {
            list_render(state, "No Saved Jobs Found", |row| {
                row.job
                    .clone()
                    .map(|job| JobCard::new(&self.backend, job, Some(&self.viewer), true))
            })
        })
    }
}
