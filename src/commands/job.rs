// Job flows: submit build/validate jobs, optionally wait for them, and
// inspect job status.

use anyhow::{bail, Result};
use std::thread;
use std::time::Duration;

use super::{choose, choose_project, print_details, project_name, Session};
use crate::cli::{JobCommand, ScopeArgs, SubmitArgs};
use crate::jobs::{self, POLL_INTERVAL};
use crate::models::{Job, JobKind};
use crate::ui;

const ALL_JOBS: &str = "/v1/jobs";

pub fn run(session: &Session<'_>, cmd: JobCommand) -> Result<()> {
    match cmd {
        JobCommand::Build(args) => submit(session, JobKind::Build, &args),
        JobCommand::Validate(args) => submit(session, JobKind::Validate, &args),
        JobCommand::Status(scope) => status(session, &scope),
    }
}

pub fn job_rows(jobs: &[Job]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Number".to_string(),
        "ID".to_string(),
        "Kind".to_string(),
        "Status".to_string(),
        "Project Name".to_string(),
    ]];
    for (i, j) in jobs.iter().enumerate() {
        rows.push(vec![
            (i + 1).to_string(),
            j.id.to_string(),
            j.kind.clone(),
            j.status.clone(),
            j.project_name.clone(),
        ]);
    }
    rows
}

fn submit(session: &Session<'_>, kind: JobKind, args: &SubmitArgs) -> Result<()> {
    let prompt = format!("{} project: ", kind.as_str());
    let project = choose_project(session, Some(args.project.trim()), &prompt)?;
    let job = session.api.create_job(kind, &project)?;
    print_details("Job Details", &job.detail_rows());

    let Some(seconds) = args.wait else {
        return Ok(());
    };
    let spinner = ui::spinner(&format!("Waiting for {} job {}...", kind.as_str(), job.id))?;
    let result = jobs::wait_for_job(
        || Ok(session.api.get_job(&job)?),
        Duration::from_secs(seconds),
        POLL_INTERVAL,
        thread::sleep,
    );
    spinner.finish_and_clear();

    let finished = result?;
    print_details("Job Details", &finished.detail_rows());
    Ok(())
}

fn status(session: &Session<'_>, scope: &ScopeArgs) -> Result<()> {
    let project = if scope.all {
        None
    } else {
        project_name(scope.project.as_deref())
    };

    let Some(name) = project else {
        let jobs = session.api.list_jobs(ALL_JOBS)?;
        return show_jobs(jobs, false);
    };
    let project = choose_project(
        session,
        Some(name.as_str()),
        "Which project's jobs would you like to see: ",
    )?;
    let jobs = session.api.list_jobs(&project.jobs_url())?;
    show_jobs(jobs, true)
}

fn show_jobs(jobs: Vec<Job>, ask: bool) -> Result<()> {
    if jobs.is_empty() {
        bail!("No job. Sorry");
    }
    if jobs.len() == 1 {
        print_details("Job Details", &jobs[0].detail_rows());
        return Ok(());
    }
    if let Some(job) = choose(jobs, job_rows, ask, "Select a job to show more details: ")? {
        print_details("Job Details", &job.detail_rows());
    }
    Ok(())
}
