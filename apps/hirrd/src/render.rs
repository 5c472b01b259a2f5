//! Plain-text rendering of page view models.

use std::fmt::Write as _;

use client_core::{
    views::{
        application_card::{ApplicationCard, StatusControl},
        job_card::JobCard,
        job_page::{JobPageRender, ViewerPanel},
        ListRender,
    },
    OperationError,
};
use shared::protocol::Company;

pub fn list<T>(list: &ListRender<T>, item: impl Fn(&T) -> String) -> String {
    match list {
        ListRender::Loading => "Loading...".to_string(),
        ListRender::Failed(message) => format!("error: {message}"),
        ListRender::Empty(message) => message.to_string(),
        ListRender::Items(items) => items.iter().map(item).collect::<Vec<_>>().join("\n"),
    }
}

pub fn job_card(card: &JobCard) -> String {
    let view = card.render();
    let mut out = format!("#{} {}", view.id, view.title);
    if let Some(company) = &view.company_name {
        let _ = write!(out, " at {company}");
    }
    let _ = write!(out, " ({})", view.location);
    if view.saved {
        out.push_str(" [saved]");
    }
    if !view.excerpt.is_empty() {
        let _ = write!(out, "\n    {}.", view.excerpt);
    }
    out
}

pub fn application_card(card: &ApplicationCard) -> String {
    let view = card.render();
    let status = match view.status {
        StatusControl::ReadOnly(status) => status.label().to_string(),
        StatusControl::Select { current, .. } => format!("{} (editable)", current.label()),
    };
    let mut out = format!(
        "#{} {} [{status}]\n    {} | {} | skills: {}\n    resume: {}",
        card.application().id,
        view.title,
        view.experience,
        view.education.label(),
        view.skills,
        view.resume_url,
    );
    if let Some(created_at) = view.created_at {
        let _ = write!(out, "\n    applied {created_at}");
    }
    out
}

pub fn companies(companies: &[Company]) -> String {
    if companies.is_empty() {
        return "No Companies Found".to_string();
    }
    companies
        .iter()
        .map(|company| format!("#{} {}", company.id, company.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn job_page(page: &JobPageRender) -> String {
    let details = match page {
        JobPageRender::Loading => return "Loading...".to_string(),
        JobPageRender::Failed(message) => return format!("error: {message}"),
        JobPageRender::Ready(details) => details,
    };

    let mut out = details.title.clone();
    if let Some(company) = &details.company_name {
        let _ = write!(out, " at {company}");
    }
    let _ = write!(
        out,
        "\n{} | {} | {}",
        details.location,
        details.applicants,
        details.hiring.label()
    );
    let _ = write!(out, "\n\nAbout the job\n{}", details.description);
    out.push_str("\n\nWhat we are looking for");
    for line in &details.requirements {
        let _ = write!(out, "\n{line}");
    }

    match &details.panel {
        ViewerPanel::Owner {
            status_placeholder,
            applications,
        } => {
            let _ = write!(out, "\n\n{status_placeholder}");
            if !applications.is_empty() {
                out.push_str("\n\nApplications");
                for application in applications {
                    let _ = write!(out, "\n{}", application_card(application));
                }
            }
        }
        ViewerPanel::Visitor { button, enabled } => {
            let state = if *enabled { "" } else { " (disabled)" };
            let _ = write!(out, "\n\n[{}]{state}", button.label());
        }
    }
    out
}

pub fn error(error: &OperationError) -> String {
    match error.category().hint() {
        Some(hint) => format!("error: {}\nhint: {hint}", error.message()),
        None => format!("error: {}", error.message()),
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
