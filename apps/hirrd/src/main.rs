mod config;
mod render;

use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    forms::{ApplyForm, CompanyForm, PostJobForm},
    views::{
        job_card::JobCard,
        job_page::{JobPage, JobPageRender, ViewerPanel},
        listing::JobListingView,
        my_jobs::MyJobsPage,
        post_job::PostJobPage,
        saved_jobs::SavedJobsPage,
        Backend, ListRender, Submission,
    },
    MissingBackend, OperationError, RestBackend, Viewer,
};
use shared::{
    domain::{ApplicationId, ApplicationStatus, CompanyId, Education, HiringStatus, JobId, Role},
    protocol::{FileUpload, JobFilter},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hirrd", about = "Browse, post and apply to jobs")]
struct Args {
    /// Config file; defaults to the per-user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List jobs, optionally filtered.
    Jobs {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        company: Option<i64>,
    },
    Companies,
    /// Show one job.
    Job { id: i64 },
    /// Open or close hiring for a job you posted.
    Hiring {
        id: i64,
        #[arg(value_parser = parse_hiring)]
        status: HiringStatus,
    },
    Apply {
        job_id: i64,
        #[arg(long)]
        experience: String,
        #[arg(long)]
        skills: String,
        #[arg(long, value_parser = parse_education)]
        education: Education,
        #[arg(long)]
        resume: PathBuf,
    },
    /// Save a job, or unsave it when it is already saved.
    Save { job_id: i64 },
    Saved,
    MyJobs,
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        company: i64,
        #[arg(long)]
        requirements: String,
    },
    AddCompany {
        #[arg(long)]
        name: String,
        #[arg(long)]
        logo: PathBuf,
    },
    DeleteJob { id: i64 },
    ApplicationStatus {
        job_id: i64,
        application_id: i64,
        #[arg(value_parser = parse_status)]
        status: ApplicationStatus,
    },
    /// Pick a role for this account.
    Onboard {
        #[arg(value_parser = parse_role)]
        role: Role,
    },
}

fn parse_hiring(raw: &str) -> Result<HiringStatus, String> {
    HiringStatus::parse(raw).ok_or_else(|| format!("expected open or closed, got '{raw}'"))
}

fn parse_education(raw: &str) -> Result<Education, String> {
    Education::parse(raw).ok_or_else(|| format!("unknown education level '{raw}'"))
}

fn parse_status(raw: &str) -> Result<ApplicationStatus, String> {
    ApplicationStatus::parse(raw).ok_or_else(|| format!("unknown application status '{raw}'"))
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("expected candidate or recruiter, got '{raw}'"))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config_path = match args.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };

    if let Command::Onboard { role } = args.command {
        config::save_role(&config_path, role)?;
        info!(path = %config_path.display(), role = role.as_str(), "role saved");
        println!("You are now onboarded as a {}.", role.as_str());
        return Ok(());
    }

    let settings = config::load_settings(&config_path)?;
    let backend: Backend = match settings.rest_config()? {
        Some(rest) => Arc::new(RestBackend::new(rest)?),
        None => Arc::new(MissingBackend),
    };

    if let Err(error) = run(args.command, backend, settings.viewer()).await {
        eprintln!("{}", render::error(&OperationError::from(error)));
        std::process::exit(1);
    }
    Ok(())
}

fn require_viewer(viewer: Option<Viewer>) -> Result<Viewer> {
    viewer.ok_or_else(|| anyhow!("sign in first: set user_id in the config or HIRRD_USER_ID"))
}

fn read_upload(path: &Path) -> Result<FileUpload> {
    let bytes = fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());
    Ok(FileUpload {
        filename,
        mime_type,
        bytes,
    })
}

fn finish<F: Debug>(submission: Submission<F>, done: &str) -> Result<()> {
    match submission {
        Submission::Accepted { navigate } => {
            println!("{done}");
            if let Some(route) = navigate {
                println!("next: {}", route.path());
            }
            Ok(())
        }
        Submission::Invalid(errors) => bail!("{errors}"),
        Submission::Blocked(reason) => bail!("{reason}"),
        Submission::Redirect(route) => {
            bail!("not available for this account; continue at {}", route.path())
        }
        Submission::Failed(error) => Err(error.into()),
    }
}

async fn run(command: Command, backend: Backend, viewer: Option<Viewer>) -> Result<()> {
    match command {
        Command::Jobs {
            search,
            location,
            company,
        } => {
            let view = JobListingView::new(backend, viewer).with_filter(JobFilter {
                location,
                company_id: company.map(CompanyId),
                search_query: search,
            });
            let (jobs, _) = view.load().await;
            jobs?;
            println!("{}", render::list(&view.render(), render::job_card));
        }
        Command::Companies => {
            let view = JobListingView::new(backend, viewer);
            let companies = view.load_companies().await?;
            println!("{}", render::companies(&companies));
        }
        Command::Job { id } => {
            let page = JobPage::new(backend, JobId(id));
            page.load().await?;
            println!("{}", render::job_page(&page.render(viewer.as_ref())));
        }
        Command::Hiring { id, status } => {
            let viewer = require_viewer(viewer)?;
            let page = JobPage::new(backend, JobId(id));
            page.load().await?;
            page.set_hiring_status(&viewer, status).await?;
            println!("Hiring is now {} for job #{id}.", status.label());
        }
        Command::Apply {
            job_id,
            experience,
            skills,
            education,
            resume,
        } => {
            let viewer = require_viewer(viewer)?;
            let mut form = ApplyForm {
                experience,
                skills,
                education: Some(education),
                resume: Some(read_upload(&resume)?),
            };
            let page = JobPage::new(backend, JobId(job_id));
            page.load().await?;
            finish(page.apply(&viewer, &mut form).await, "Application submitted.")?;
        }
        Command::Save { job_id } => {
            let viewer = require_viewer(viewer)?;
            let job_id = JobId(job_id);
            let saved_page = SavedJobsPage::new(Arc::clone(&backend), viewer.clone());
            saved_page.load().await?;
            let existing = match saved_page.render() {
                ListRender::Items(cards) => cards.into_iter().find(|card| card.job().id == job_id),
                _ => None,
            };
            let mut card = match existing {
                Some(card) => card,
                None => {
                    let page = JobPage::new(Arc::clone(&backend), job_id);
                    let job = page.load().await?;
                    JobCard::new(&backend, job, Some(&viewer), false)
                }
            };
            let saved = saved_page.toggle_save(&mut card).await?;
            if saved {
                println!("Saved job #{job_id}.");
            } else {
                println!("Removed job #{job_id} from saved jobs.");
            }
        }
        Command::Saved => {
            let viewer = require_viewer(viewer)?;
            let page = SavedJobsPage::new(backend, viewer);
            page.load().await?;
            println!("Saved Jobs\n{}", render::list(&page.render(), render::job_card));
        }
        Command::MyJobs => {
            let viewer = require_viewer(viewer)?;
            let page = MyJobsPage::for_viewer(backend, &viewer);
            page.load().await?;
            match &page {
                MyJobsPage::Applications(list) => println!(
                    "My Applications\n{}",
                    render::list(&list.render(), render::application_card)
                ),
                MyJobsPage::Jobs(list) => {
                    println!("My Jobs\n{}", render::list(&list.render(), render::job_card))
                }
                MyJobsPage::NeedsOnboarding => {
                    bail!("choose a role first: hirrd onboard <candidate|recruiter>")
                }
            }
        }
        Command::Post {
            title,
            description,
            location,
            company,
            requirements,
        } => {
            let viewer = require_viewer(viewer)?;
            let page = PostJobPage::new(backend);
            let form = PostJobForm {
                title,
                description,
                location,
                company_id: Some(CompanyId(company)),
                requirements,
            };
            finish(page.submit(&viewer, &form).await, "Job posted.")?;
        }
        Command::AddCompany { name, logo } => {
            let viewer = require_viewer(viewer)?;
            let page = PostJobPage::new(backend);
            let form = CompanyForm {
                name,
                logo: Some(read_upload(&logo)?),
            };
            finish(page.add_company(&viewer, &form).await, "Company added.")?;
            if let Some(companies) = page.companies().data {
                println!("{}", render::companies(&companies));
            }
        }
        Command::DeleteJob { id } => {
            let viewer = require_viewer(viewer)?;
            let page = MyJobsPage::for_viewer(backend, &viewer);
            let MyJobsPage::Jobs(list) = &page else {
                bail!("only recruiters can delete jobs");
            };
            list.load().await?;
            let rendered = list.render();
            let card = rendered
                .items()
                .iter()
                .find(|card| card.job().id == JobId(id))
                .ok_or_else(|| anyhow!("job #{id} is not one of your postings"))?;
            list.delete_job(card).await?;
            println!("Deleted job #{id}.");
        }
        Command::ApplicationStatus {
            job_id,
            application_id,
            status,
        } => {
            let viewer = require_viewer(viewer)?;
            let page = JobPage::new(backend, JobId(job_id));
            page.load().await?;
            let details = match page.render(Some(&viewer)) {
                JobPageRender::Ready(details) => details,
                _ => bail!("job #{job_id} could not be loaded"),
            };
            let ViewerPanel::Owner { applications, .. } = &details.panel else {
                bail!("only the recruiter who posted job #{job_id} can update applications");
            };
            let card = applications
                .iter()
                .find(|card| card.application().id == ApplicationId(application_id))
                .ok_or_else(|| anyhow!("application #{application_id} not found on job #{job_id}"))?;
            card.set_status(status).await?;
            println!("Application #{application_id} is now {}.", status.label());
        }
        Command::Onboard { .. } => bail!("onboard runs before a backend is configured"),
    }
    Ok(())
}
