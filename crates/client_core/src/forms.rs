//! Form schemas for posting jobs, applying and adding companies.
//!
//! Validation runs before any remote call; a form that fails validation never
//! reaches its controller.

use std::fmt;

use shared::{
    domain::{CompanyId, Education},
    protocol::{FileUpload, NewCompany},
};

const RESUME_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];
const LOGO_MIME_TYPES: &[&str] = &["image/png", "image/jpeg"];

/// Per-field messages in field declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors<F> {
    errors: Vec<(F, &'static str)>,
}

impl<F> Default for FieldErrors<F> {
    fn default() -> Self {
        Self { errors: Vec::new() }
    }
}

impl<F: Copy + PartialEq> FieldErrors<F> {
    fn push(&mut self, field: F, message: &'static str) {
        self.errors.push((field, message));
    }

    pub fn get(&self, field: F) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, message)| *message)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &'static str)> + '_ {
        self.errors.iter().copied()
    }

    pub fn messages(&self) -> Vec<&'static str> {
        self.errors.iter().map(|(_, message)| *message).collect()
    }
}

impl<F: fmt::Debug> fmt::Display for FieldErrors<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (field, message)) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field:?}: {message}")?;
        }
        Ok(())
    }
}

impl<F: fmt::Debug> std::error::Error for FieldErrors<F> {}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn has_mime(file: &FileUpload, allowed: &[&str]) -> bool {
    file.mime_type
        .as_deref()
        .is_some_and(|mime| allowed.iter().any(|ok| ok.eq_ignore_ascii_case(mime)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyField {
    Experience,
    Skills,
    Education,
    Resume,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyForm {
    /// Raw numeric input, years of experience.
    pub experience: String,
    pub skills: String,
    pub education: Option<Education>,
    pub resume: Option<FileUpload>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidApplication {
    pub experience: u32,
    pub skills: String,
    pub education: Education,
    pub resume: FileUpload,
}

impl ApplyForm {
    pub fn validate(&self) -> Result<ValidApplication, FieldErrors<ApplyField>> {
        let mut errors = FieldErrors::default();

        let experience = match self.experience.trim().parse::<f64>() {
            Ok(years) if !years.is_finite() => {
                errors.push(ApplyField::Experience, "Experience must be a number");
                None
            }
            Ok(years) if years < 0.0 => {
                errors.push(ApplyField::Experience, "Experience must be at least 0");
                None
            }
            Ok(years) if years.fract() != 0.0 => {
                errors.push(ApplyField::Experience, "Experience must be a whole number");
                None
            }
            Ok(years) if years > f64::from(u32::MAX) => {
                errors.push(ApplyField::Experience, "Experience must be a number");
                None
            }
            Ok(years) => Some(years as u32),
            Err(_) => {
                errors.push(ApplyField::Experience, "Experience must be a number");
                None
            }
        };

        if blank(&self.skills) {
            errors.push(ApplyField::Skills, "Skills are required");
        }
        if self.education.is_none() {
            errors.push(ApplyField::Education, "Education is required");
        }
        let resume = self
            .resume
            .as_ref()
            .filter(|file| has_mime(file, RESUME_MIME_TYPES));
        if resume.is_none() {
            errors.push(ApplyField::Resume, "Only PDF or Word documents are allowed");
        }

        match (experience, self.education, resume) {
            (Some(experience), Some(education), Some(resume)) if errors.is_empty() => {
                Ok(ValidApplication {
                    experience,
                    skills: self.skills.trim().to_string(),
                    education,
                    resume: resume.clone(),
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostJobField {
    Title,
    Description,
    Location,
    Company,
    Requirements,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostJobForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub company_id: Option<CompanyId>,
    /// Markdown.
    pub requirements: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub company_id: CompanyId,
    pub requirements: String,
}

impl PostJobForm {
    pub fn validate(&self) -> Result<ValidJob, FieldErrors<PostJobField>> {
        let mut errors = FieldErrors::default();
        if blank(&self.title) {
            errors.push(PostJobField::Title, "Title is required");
        }
        if blank(&self.description) {
            errors.push(PostJobField::Description, "Description is required");
        }
        if blank(&self.location) {
            errors.push(PostJobField::Location, "Select a location");
        }
        if self.company_id.is_none() {
            errors.push(PostJobField::Company, "Select or Add a new Company");
        }
        if blank(&self.requirements) {
            errors.push(PostJobField::Requirements, "Requirements are required");
        }

        match self.company_id {
            Some(company_id) if errors.is_empty() => Ok(ValidJob {
                title: self.title.trim().to_string(),
                description: self.description.trim().to_string(),
                location: self.location.trim().to_string(),
                company_id,
                requirements: self.requirements.clone(),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompanyField {
    Name,
    Logo,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyForm {
    pub name: String,
    pub logo: Option<FileUpload>,
}

impl CompanyForm {
    pub fn validate(&self) -> Result<NewCompany, FieldErrors<CompanyField>> {
        let mut errors = FieldErrors::default();
        if blank(&self.name) {
            errors.push(CompanyField::Name, "Company name is required");
        }
        let logo = self
            .logo
            .as_ref()
            .filter(|file| has_mime(file, LOGO_MIME_TYPES));
        if logo.is_none() {
            errors.push(CompanyField::Logo, "Only Images are allowed");
        }

        match logo {
            Some(logo) if errors.is_empty() => Ok(NewCompany {
                name: self.name.trim().to_string(),
                logo: logo.clone(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[path = "tests/forms_tests.rs"]
mod tests;
