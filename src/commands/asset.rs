// Asset flows. Uploads read the file, run it through preflight and only
// then talk to the server; in a batch every file is handled on its own so
// one bad file never stops the rest.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{choose, choose_project, delete_model, print_details, project_name, Session};
use crate::cli::{AssetCommand, ScopeArgs};
use crate::markdown;
use crate::models::{Asset, AssetParam, Project};
use crate::preflight::{self, PreflightError, MAX_ASSET_LEN};
use crate::ui;

const ALL_ASSETS: &str = "/v1/assets";

pub fn run(session: &Session<'_>, cmd: AssetCommand) -> Result<()> {
    match cmd {
        AssetCommand::Add {
            project,
            file,
            files,
        } => {
            let name = project_name(project.project.as_deref());
            let project = choose_project(session, name.as_deref(), "Add asset to: ")?;
            let paths: Vec<_> = file.into_iter().chain(files).collect();
            if paths.is_empty() {
                bail!("No files given");
            }
            let failed = add_all(session, &project, &paths);
            if failed > 0 {
                bail!("{failed} of {} file(s) could not be uploaded", paths.len());
            }
            Ok(())
        }
        AssetCommand::List(scope) => list(session, &scope),
        AssetCommand::Get { project, file } => {
            let name = project_name(project.project.as_deref());
            let project = choose_project(session, name.as_deref(), "Download asset from: ")?;
            download(session, &project, file.trim())
        }
        AssetCommand::Delete { project, count } => {
            let asset = match project_name(project.project.as_deref()) {
                None => choose_asset(session, ALL_ASSETS, true, "Which one shall be deleted: ", count)?,
                Some(name) => {
                    let project = choose_project(
                        session,
                        Some(name.as_str()),
                        "Which project's assets would you like to see: ",
                    )?;
                    choose_asset(session, &project.assets_url(), true, "Which one shall be removed: ", count)?
                }
            };
            match asset {
                Some(asset) => delete_model(session, "asset", &asset),
                None => bail!("No asset. Sorry"),
            }
        }
        AssetCommand::Update(scope) => update(session, &scope),
    }
}

/// Read `path` and turn it into an upload envelope, refusing files that
/// fail preflight.
pub fn prepare_upload(path: &Path) -> Result<AssetParam> {
    let content = read_bounded(path)?;
    let name = path.to_string_lossy();
    let checked = preflight::preflight(&content, &name)?;
    debug!(file = %name, format = %checked.format, "preflight passed");
    Ok(AssetParam::new(&name, checked.mime_type(), &content))
}

/// Read at most one byte past `MAX_ASSET_LEN`; anything known to be larger
/// is refused before a single byte is read.
fn read_bounded(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("reading {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("reading {}", path.display()))?
        .len();
    if len > MAX_ASSET_LEN as u64 {
        return Err(PreflightError::TooLarge {
            len: usize::try_from(len).unwrap_or(usize::MAX),
            max: MAX_ASSET_LEN,
        }
        .into());
    }
    let mut content = Vec::new();
    file.take(MAX_ASSET_LEN as u64 + 1)
        .read_to_end(&mut content)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(content)
}

fn upload(session: &Session<'_>, project: &Project, path: &Path) -> Result<Asset> {
    let param = prepare_upload(path).context("Creating request")?;
    let spinner = ui::spinner(&format!("Uploading {}...", path.display()))?;
    let result = session.api.create_asset(project, &param);
    spinner.finish_and_clear();
    result.context("Creating asset")
}

/// Upload each path independently. Returns how many failed.
fn add_all(session: &Session<'_>, project: &Project, paths: &[std::path::PathBuf]) -> usize {
    let mut failed = 0;
    for path in paths {
        match fs::metadata(path) {
            Err(_) => {
                println!("Unable to read from {}, skipping", path.display());
                failed += 1;
                continue;
            }
            Ok(meta) if meta.is_dir() => {
                println!("Is a directory: {}, skipping", path.display());
                failed += 1;
                continue;
            }
            Ok(_) => {}
        }
        println!("Uploading {} ...", path.display());
        match upload(session, project, path) {
            Ok(asset) => print_details("Asset Details", &asset.detail_rows()),
            Err(e) => {
                ui::report_error(&format!("Uploading {}", path.display()), &e);
                failed += 1;
            }
        }
    }
    failed
}

pub fn asset_rows(assets: &[Asset]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Number".to_string(),
        "Name".to_string(),
        "Project Name".to_string(),
        "Origin".to_string(),
    ]];
    for (i, a) in assets.iter().enumerate() {
        rows.push(vec![
            (i + 1).to_string(),
            a.name.clone(),
            a.project_name.clone(),
            a.origin.clone(),
        ]);
    }
    rows
}

/// Keep only the last `count` assets; zero keeps all.
pub fn last_n<T>(mut items: Vec<T>, count: usize) -> Vec<T> {
    if count != 0 && items.len() > count {
        items.drain(..items.len() - count);
    }
    items
}

fn choose_asset(
    session: &Session<'_>,
    endpoint: &str,
    ask: bool,
    prompt: &str,
    count: usize,
) -> Result<Option<Asset>> {
    let assets = session.api.list_assets(endpoint)?;
    if assets.is_empty() {
        bail!("No asset. Sorry");
    }
    let assets = last_n(assets, count);
    if assets.len() == 1 {
        print_details("Asset Details", &assets[0].detail_rows());
        return Ok(assets.into_iter().next());
    }
    choose(assets, asset_rows, ask, prompt)
}

fn list(session: &Session<'_>, scope: &ScopeArgs) -> Result<()> {
    let endpoint = if scope.all {
        ALL_ASSETS.to_string()
    } else {
        let name = project_name(scope.project.as_deref());
        let project = choose_project(
            session,
            name.as_deref(),
            "Which project's assets would you like to see: ",
        )?;
        project.assets_url()
    };
    let assets = session.api.list_assets(&endpoint)?;
    match assets.as_slice() {
        [] => println!("No assets found"),
        [one] => print_details("Asset Details", &one.detail_rows()),
        many => print!("{}", markdown::table(&asset_rows(many))),
    }
    Ok(())
}

fn download(session: &Session<'_>, project: &Project, file: &str) -> Result<()> {
    if file.is_empty() {
        bail!("No asset name given");
    }
    let written = save_download(Path::new(file), || {
        session.api.fetch_asset(project, file).map_err(Into::into)
    })
    .context("Downloading asset")?;
    info!(file, bytes = written, "asset downloaded");
    println!("Downloaded {file}");
    Ok(())
}

/// Write the body produced by `fetch` to `dest`. The body is staged in a
/// temporary file beside `dest`, which only replaces `dest` once the whole
/// body has arrived; on any failure an existing `dest` stays as it was.
pub fn save_download<R, F>(dest: &Path, fetch: F) -> Result<u64>
where
    R: Read,
    F: FnOnce() -> Result<R>,
{
    let mut body = fetch()?;
    let dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    let written = io::copy(&mut body, &mut staged).context("receiving asset content")?;
    staged
        .persist(dest)
        .map_err(|e| e.error)
        .with_context(|| format!("saving {}", dest.display()))?;
    Ok(written)
}

/// Whether the local copy at `path` was modified after `updated_at`.
pub fn update_available(path: &Path, updated_at: DateTime<Utc>) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|modified| DateTime::<Utc>::from(modified) > updated_at)
        .unwrap_or(false)
}

fn update(session: &Session<'_>, scope: &ScopeArgs) -> Result<()> {
    let name = if scope.all {
        None
    } else {
        match project_name(scope.project.as_deref()) {
            Some(name) => Some(name),
            None => bail!("--all flag not set, no --project specified, no project lock found"),
        }
    };

    let assets = session.api.list_assets(ALL_ASSETS)?;
    let projects = session.api.list_projects()?;

    let mut table = vec![[
        "ID", "Name", "ProjectId", "ProjectName", "Origin", "CreatedAt", "UpdatedAt", "Status",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect::<Vec<_>>()];

    for asset in &assets {
        if let Some(name) = &name {
            if !asset.project_name.contains(name.as_str()) {
                continue;
            }
        }
        let path = Path::new(&asset.name);
        if !update_available(path, asset.updated_at) {
            continue;
        }
        let Some(project) = projects.iter().find(|p| p.id == asset.project_id) else {
            println!("Project ID {} not found", asset.project_id);
            continue;
        };
        if let Err(e) = upload(session, project, path) {
            ui::report_error(&format!("Updating {}", asset.name), &e);
            continue;
        }
        table.push(vec![
            asset.id.to_string(),
            asset.name.clone(),
            asset.project_id.to_string(),
            asset.project_name.clone(),
            asset.origin.clone(),
            asset.created_at.to_string(),
            asset.updated_at.to_string(),
            "Update".to_string(),
        ]);
    }

    let rows = table.len() - 1;
    if rows == 0 {
        println!("All assets are up to date");
        return Ok(());
    }
    let plural = if rows == 1 { "" } else { "s" };
    print_details(&format!("Updated {rows} asset{plural}"), &table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::ConfigStore;
    use crate::models::Auth;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;

    struct NoLogin;

    impl ConfigStore for NoLogin {
        fn read_auth(&self) -> Result<Auth> {
            Ok(Auth::default())
        }

        fn write_auth(&self, _auth: &Auth) -> Result<()> {
            Ok(())
        }
    }

    /// Reader that yields some bytes and then breaks, like a dropped
    /// connection.
    struct Interrupted(usize);

    impl Read for Interrupted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0 == 0 {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            let n = self.0.min(buf.len());
            buf[..n].fill(b'x');
            self.0 -= n;
            Ok(n)
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn last_n_keeps_tail() {
        assert_eq!(last_n(vec![1, 2, 3, 4], 2), vec![3, 4]);
        assert_eq!(last_n(vec![1, 2], 5), vec![1, 2]);
        assert_eq!(last_n(vec![1, 2, 3], 0), vec![1, 2, 3]);
    }

    #[test]
    fn prepare_upload_wraps_content_in_data_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.yaml");
        fs::write(&path, "title: demo\n").unwrap();
        let param = prepare_upload(&path).unwrap();
        assert!(param.asset.name.ends_with("api.yaml"));
        assert!(param.asset.asset.starts_with("data:application/x-yaml;base64,"));
    }

    #[test]
    fn prepare_upload_refuses_bad_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.raml");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"title: no marker\n").unwrap();
        let err = prepare_upload(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<preflight::PreflightError>(),
            Some(&preflight::PreflightError::InvalidRaml)
        );
    }

    #[test]
    fn prepare_upload_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(prepare_upload(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn update_needs_newer_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        assert!(!update_available(&path, Utc::now()));
        fs::write(&path, "{}").unwrap();
        assert!(update_available(&path, DateTime::<Utc>::default()));
        assert!(!update_available(&path, Utc::now() + chrono::Duration::hours(1)));
    }

    #[test]
    fn asset_rows_have_header() {
        let rows = asset_rows(&[Asset {
            name: "a.json".into(),
            ..Asset::default()
        }]);
        assert_eq!(rows[0][1], "Name");
        assert_eq!(rows[1], vec!["1", "a.json", "", ""]);
    }

    #[test]
    fn failed_download_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("api.yaml");
        fs::write(&dest, "title: local work\n").unwrap();

        let store = NoLogin;
        let session = Session::new(ApiClient::new("http://127.0.0.1:9/").unwrap(), &store);
        let project = Project {
            id: 1,
            ..Project::default()
        };
        let err = save_download(&dest, || {
            session.api.fetch_asset(&project, "api.yaml").map_err(Into::into)
        })
        .unwrap_err();

        assert!(err.to_string().contains("logged in"));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "title: local work\n");
        assert_eq!(entries(dir.path()), vec!["api.yaml"]);
    }

    #[test]
    fn broken_transfer_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("api.json");
        fs::write(&dest, "{}").unwrap();

        assert!(save_download(&dest, || Ok(Interrupted(64))).is_err());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "{}");
        assert_eq!(entries(dir.path()), vec!["api.json"]);
    }

    #[test]
    fn failed_download_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("new.json");
        let res = save_download(&dest, || -> Result<Cursor<Vec<u8>>> { bail!("404 Not Found") });
        assert!(res.is_err());
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn completed_download_replaces_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("api.json");
        fs::write(&dest, "old").unwrap();

        let written = save_download(&dest, || Ok(Cursor::new(b"{\"a\":1}".to_vec()))).unwrap();
        assert_eq!(written, 7);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "{\"a\":1}");
        assert_eq!(entries(dir.path()), vec!["api.json"]);
    }

    #[test]
    fn oversized_file_is_refused_before_reading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.json");
        fs::write(&path, vec![b' '; MAX_ASSET_LEN + 1]).unwrap();
        let err = prepare_upload(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PreflightError>(),
            Some(&PreflightError::TooLarge {
                len: MAX_ASSET_LEN + 1,
                max: MAX_ASSET_LEN,
            })
        );
    }
}
