// Command flows. `run` wires the collaborators together (HTTP client,
// config store, terminal) and dispatches to the per-area modules; each flow
// receives the `Session` explicitly instead of reaching for globals.

pub mod asset;
pub mod job;
pub mod project;
pub mod server;
pub mod user;

use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::cli::{Cli, Commands};
use crate::config::{read_project_lock, ConfigStore, FileConfigStore};
use crate::markdown;
use crate::models::{ApiModel, Project};
use crate::ui;
use crate::version_check::{self, UpdateStatus};

/// Client version reported to the update check.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Collaborators shared by every command flow.
pub struct Session<'a> {
    pub api: ApiClient,
    pub store: &'a dyn ConfigStore,
}

impl<'a> Session<'a> {
    /// Build a session and load the stored login, if any.
    pub fn new(mut api: ApiClient, store: &'a dyn ConfigStore) -> Self {
        match store.read_auth() {
            Ok(auth) => api.set_auth(auth),
            Err(e) => warn!("cannot read config: {e:#}"),
        }
        Session { api, store }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        server::show_banner();
        println!("Run `slyft --help` for the list of commands.");
        return Ok(());
    };

    let api = ApiClient::from_env()?;
    debug!(backend = api.base_url(), "using backend");

    if !cli.no_update_check && !matches!(command, Commands::Info) {
        update_check(&api)?;
    }

    let store = FileConfigStore::in_home_dir()?;
    let mut session = Session::new(api, &store);

    match command {
        Commands::User(cmd) => user::run(&mut session, cmd),
        Commands::Project(cmd) => project::run(&session, cmd),
        Commands::Asset(cmd) => asset::run(&session, cmd),
        Commands::Job(cmd) => job::run(&session, cmd),
        Commands::Ping => server::ping(&session),
        Commands::Info => {
            server::show_info();
            Ok(())
        }
    }
}

fn update_check(api: &ApiClient) -> Result<()> {
    match version_check::check(api, VERSION) {
        Ok(UpdateStatus::UpToDate) => Ok(()),
        Ok(UpdateStatus::UpdateAvailable { latest }) => {
            println!("A newer version ({latest}) is available, consider updating.");
            Ok(())
        }
        Ok(UpdateStatus::UpdateRequired { latest }) => {
            bail!("You need to update your application. Your version: {VERSION}, latest version: {latest}")
        }
        Err(e) => {
            debug!("update check failed: {e}");
            Ok(())
        }
    }
}

/// Project name from the command line, else from `.slyftproject`.
pub fn project_name(arg: Option<&str>) -> Option<String> {
    let arg = arg.map(str::trim).filter(|s| !s.is_empty());
    match arg {
        Some(name) => Some(name.to_string()),
        None => std::env::current_dir()
            .ok()
            .and_then(|dir| read_project_lock(&dir)),
    }
}

/// Projects whose name contains `fragment`; everything when there is none.
pub fn filter_projects(projects: Vec<Project>, fragment: Option<&str>) -> Vec<Project> {
    match fragment {
        Some(fragment) => projects
            .into_iter()
            .filter(|p| p.name.contains(fragment))
            .collect(),
        None => projects,
    }
}

pub fn project_rows(projects: &[Project]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Number".to_string(),
        "Name".to_string(),
        "Details".to_string(),
        "Created At".to_string(),
    ]];
    for (i, p) in projects.iter().enumerate() {
        rows.push(vec![
            (i + 1).to_string(),
            p.name.clone(),
            p.details.clone(),
            p.created_at.to_string(),
        ]);
    }
    rows
}

/// Resolve a single project: one match is taken as-is, several are listed
/// and the user picks one.
pub fn choose_project(session: &Session<'_>, name: Option<&str>, prompt: &str) -> Result<Project> {
    let projects = filter_projects(session.api.list_projects()?, name);
    match choose(projects, project_rows, true, prompt)? {
        Some(project) => Ok(project),
        None => bail!("No project found"),
    }
}

/// Display `items` and let the user pick one. With a single item that item
/// is returned; when `ask` is off nothing is chosen from several.
pub fn choose<T>(
    mut items: Vec<T>,
    rows: fn(&[T]) -> Vec<Vec<String>>,
    ask: bool,
    prompt: &str,
) -> Result<Option<T>> {
    if items.is_empty() {
        return Ok(None);
    }
    print!("{}", markdown::table(&rows(&items)));
    if items.len() == 1 {
        return Ok(items.pop());
    }
    if !ask {
        return Ok(None);
    }
    let index = ui::choose_row(prompt, items.len())?;
    Ok(Some(items.swap_remove(index)))
}

/// Confirm, then DELETE `model`.
pub fn delete_model(session: &Session<'_>, what: &str, model: &dyn ApiModel) -> Result<()> {
    if !ui::confirm(&format!("Are you sure to delete {what} '{}'?", model.name()))? {
        println!("Good decision!");
        return Ok(());
    }
    session.api.delete(model)?;
    println!("Was successfully deleted");
    Ok(())
}

pub fn print_details(title: &str, rows: &[Vec<String>]) {
    print!("{}{}", markdown::heading(title, 1), markdown::table(rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: i64, name: &str) -> Project {
        Project {
            id,
            name: name.to_string(),
            ..Project::default()
        }
    }

    #[test]
    fn filters_by_name_fragment() {
        let all = vec![project(1, "weather-api"), project(2, "billing"), project(3, "weather-ui")];
        let names: Vec<_> = filter_projects(all.clone(), Some("weather"))
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(names, vec![1, 3]);
        assert_eq!(filter_projects(all, None).len(), 3);
    }

    #[test]
    fn single_item_is_chosen_without_asking() {
        let chosen = choose(vec![project(4, "only")], project_rows, true, "pick").unwrap();
        assert_eq!(chosen.map(|p| p.id), Some(4));
    }

    #[test]
    fn several_items_without_asking_choose_nothing() {
        let chosen = choose(vec![project(1, "a"), project(2, "b")], project_rows, false, "").unwrap();
        assert!(chosen.is_none());
    }

    #[test]
    fn empty_list_chooses_nothing() {
        assert!(choose(Vec::<Project>::new(), project_rows, true, "").unwrap().is_none());
    }

    #[test]
    fn explicit_project_name_wins() {
        assert_eq!(project_name(Some("  demo ")).as_deref(), Some("demo"));
    }

    #[test]
    fn rows_are_numbered_from_one() {
        let rows = project_rows(&[project(1, "a"), project(2, "b")]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][0], "2");
        assert_eq!(rows[2][1], "b");
    }
}
