use std::sync::Arc;

use shared::{
    domain::CompanyId,
    protocol::{Company, Job, JobFilter},
};
use tracing::debug;

use super::{job_card::JobCard, list_render, Backend, ListRender, Viewer};
use crate::{
    error::OperationError,
    resource::{AsyncResource, AsyncState, Trigger},
};

/// Job listing with search, location and company filters.
///
/// Every filter change re-runs the job fetch with the whole filter; only the
/// latest fetch may commit, so a slow earlier filter never replaces a newer one.
pub struct JobListingView {
    backend: Backend,
    viewer: Option<Viewer>,
    filter: JobFilter,
    jobs: AsyncResource<(), JobFilter, Vec<Job>>,
    companies: AsyncResource<(), (), Vec<Company>>,
}

impl JobListingView {
    pub fn new(backend: Backend, viewer: Option<Viewer>) -> Self {
        let jobs_backend = Arc::clone(&backend);
        let jobs = AsyncResource::new("get_jobs", move |filter: JobFilter| {
            let backend = Arc::clone(&jobs_backend);
            async move { backend.get_jobs(&filter).await }
        });

        let companies_backend = Arc::clone(&backend);
        let companies = AsyncResource::new("get_companies", move |()| {
            let backend = Arc::clone(&companies_backend);
            async move { backend.get_companies().await }
        });

        Self {
            backend,
            viewer,
            filter: JobFilter::default(),
            jobs,
            companies,
        }
    }

    /// Starts from an existing filter instead of the empty one. Blank values
    /// are dropped the same way the individual setters drop them.
    pub fn with_filter(mut self, filter: JobFilter) -> Self {
        self.filter = JobFilter {
            location: filter.location.filter(|value| !value.trim().is_empty()),
            company_id: filter.company_id,
            search_query: filter
                .search_query
                .map(|query| query.trim().to_string())
                .filter(|query| !query.is_empty()),
        };
        self
    }

    /// Initial fetch of jobs and the company filter options.
    pub async fn load(
        &self,
    ) -> (
        Result<Vec<Job>, OperationError>,
        Result<Vec<Company>, OperationError>,
    ) {
        tokio::join!(self.refetch(), self.load_companies())
    }

    pub fn load_companies(&self) -> Trigger<Vec<Company>> {
        self.companies.trigger(())
    }

    pub fn filter(&self) -> &JobFilter {
        &self.filter
    }

    /// Applies a title search. Blank queries leave the filter untouched.
    pub fn search(&mut self, query: &str) -> Option<Trigger<Vec<Job>>> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.filter.search_query = Some(query.to_string());
        Some(self.refetch())
    }

    pub fn set_location(&mut self, location: Option<String>) -> Trigger<Vec<Job>> {
        self.filter.location = location.filter(|value| !value.trim().is_empty());
        self.refetch()
    }

    pub fn set_company(&mut self, company_id: Option<CompanyId>) -> Trigger<Vec<Job>> {
        self.filter.company_id = company_id;
        self.refetch()
    }

    pub fn clear_filters(&mut self) -> Trigger<Vec<Job>> {
        self.filter = JobFilter::default();
        self.refetch()
    }

    fn refetch(&self) -> Trigger<Vec<Job>> {
        debug!(filter = ?self.filter, unfiltered = self.filter.is_empty(), "fetching jobs");
        self.jobs.trigger(self.filter.clone())
    }

    pub fn jobs_state(&self) -> AsyncState<Vec<Job>> {
        self.jobs.state()
    }

    pub fn companies(&self) -> Vec<Company> {
        self.companies.data().unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.jobs.is_loading() || self.companies.is_loading()
    }

    /// Cards are mounted fresh for each render, seeded from the saved markers.
    pub fn render(&self) -> ListRender<JobCard> {
        self.jobs.with_state(|state| {
            list_render(state, "No Jobs Found", |job| {
                Some(JobCard::new(
                    &self.backend,
                    job.clone(),
                    self.viewer.as_ref(),
                    !job.saved.is_empty(),
                ))
            })
        })
    }
}
