// Project flows: create, list, show, delete.

use anyhow::Result;

use super::{choose_project, delete_model, print_details, project_name, project_rows, Session};
use crate::cli::ProjectCommand;
use crate::markdown;
use crate::ui;

pub fn run(session: &Session<'_>, cmd: ProjectCommand) -> Result<()> {
    match cmd {
        ProjectCommand::Create { name, details } => create(session, name, details),
        ProjectCommand::List => list(session),
        ProjectCommand::Show(arg) => {
            let name = project_name(arg.project.as_deref());
            let project = choose_project(session, name.as_deref(), "Which project would you like to see: ")?;
            print_details("Project Details", &project.detail_rows());
            Ok(())
        }
        ProjectCommand::Delete(arg) => {
            let name = project_name(arg.project.as_deref());
            let project = choose_project(session, name.as_deref(), "Which project shall be deleted: ")?;
            delete_model(session, "project", &project)
        }
    }
}

fn create(session: &Session<'_>, name: Option<String>, details: Option<String>) -> Result<()> {
    let name = match name.filter(|n| !n.trim().is_empty()) {
        Some(name) => name,
        None => ui::read_line("Please provide project name", false)?,
    };
    let details = match details {
        Some(details) => details,
        None => ui::read_line("Details to the project", true)?,
    };

    let project = session.api.create_project(&name, &details)?;
    print_details("Project created", &project.detail_rows());
    Ok(())
}

fn list(session: &Session<'_>) -> Result<()> {
    let projects = session.api.list_projects()?;
    if projects.is_empty() {
        println!("No projects found");
        return Ok(());
    }
    print!("{}", markdown::table(&project_rows(&projects)));
    Ok(())
}
