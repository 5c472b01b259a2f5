//! Page view models. Each page owns its controllers for as long as it is mounted;
//! nothing is cached across pages.

use std::sync::Arc;

use shared::{
    domain::{JobId, Role, UserId},
    protocol::Job,
};

use crate::{
    backend::JobBoardBackend,
    error::OperationError,
    forms::FieldErrors,
    resource::{AsyncState, Phase},
};

pub mod application_card;
pub mod job_card;
pub mod job_page;
pub mod listing;
pub mod my_jobs;
pub mod post_job;
pub mod saved_jobs;

pub type Backend = Arc<dyn JobBoardBackend>;

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub full_name: String,
    /// `None` until onboarding picks a role.
    pub role: Option<Role>,
}

impl Viewer {
    pub fn new(user_id: impl Into<String>, full_name: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            full_name: full_name.into(),
            role,
        }
    }

    pub fn is_recruiter(&self) -> bool {
        self.role == Some(Role::Recruiter)
    }
}

/// Relationship between the viewer and a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owner,
    Visitor,
}

impl Ownership {
    pub fn of(viewer: Option<&Viewer>, job: &Job) -> Self {
        match viewer {
            Some(viewer) if viewer.user_id == job.recruiter_id => Ownership::Owner,
            _ => Ownership::Visitor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Onboarding,
    Jobs,
    Job(JobId),
    PostJob,
    MyJobs,
    SavedJobs,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Onboarding => "/onboarding".to_string(),
            Route::Jobs => "/jobs".to_string(),
            Route::Job(id) => format!("/job/{id}"),
            Route::PostJob => "/post-job".to_string(),
            Route::MyJobs => "/my-jobs".to_string(),
            Route::SavedJobs => "/saved-jobs".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub route: Route,
}

/// Header links for the current viewer.
pub fn navigation(viewer: Option<&Viewer>) -> Vec<NavLink> {
    let Some(viewer) = viewer else {
        return vec![NavLink {
            label: "Login",
            route: Route::Onboarding,
        }];
    };

    let mut links = Vec::with_capacity(3);
    if viewer.is_recruiter() {
        links.push(NavLink {
            label: "Post a Job",
            route: Route::PostJob,
        });
    }
    links.push(NavLink {
        label: "My Jobs",
        route: Route::MyJobs,
    });
    links.push(NavLink {
        label: "Saved Jobs",
        route: Route::SavedJobs,
    });
    links
}

/// Render state of a list-backed page.
#[derive(Debug, PartialEq)]
pub enum ListRender<T> {
    Loading,
    Failed(String),
    Empty(&'static str),
    Items(Vec<T>),
}

impl<T> ListRender<T> {
    pub fn items(&self) -> &[T] {
        match self {
            ListRender::Items(items) => items,
            _ => &[],
        }
    }
}

pub(crate) fn list_render<S, T>(
    state: &AsyncState<Vec<S>>,
    empty: &'static str,
    map: impl FnMut(&S) -> Option<T>,
) -> ListRender<T> {
    match state.phase() {
        Phase::Idle | Phase::Loading => ListRender::Loading,
        Phase::Failed(error) => ListRender::Failed(error.message().to_string()),
        Phase::Ready(rows) => {
            let items: Vec<T> = rows.iter().filter_map(map).collect();
            if items.is_empty() {
                ListRender::Empty(empty)
            } else {
                ListRender::Items(items)
            }
        }
    }
}

/// Outcome of submitting a form through its controller.
#[derive(Debug, PartialEq)]
pub enum Submission<F> {
    /// Validation failed; no remote call was made.
    Invalid(FieldErrors<F>),
    /// The page refused the submission in its current state.
    Blocked(&'static str),
    /// The viewer may not use this page.
    Redirect(Route),
    Failed(OperationError),
    Accepted { navigate: Option<Route> },
}

impl<F> Submission<F> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted { .. })
    }
}

#[cfg(test)]
#[path = "../tests/views_tests.rs"]
mod tests;
