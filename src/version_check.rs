// Client version check against the published client config. A newer
// release only produces a hint; versions listed under `update` must be
// upgraded before the client may be used.

use serde::Deserialize;
use std::cmp::Ordering;

use crate::api::{ApiClient, ApiError};

/// Published client configuration.
pub const CONFIG_JSON_URL: &str =
    "https://s3-eu-west-1.amazonaws.com/io-slyft-config/slyft-config.json";

#[derive(Deserialize, Debug, Default)]
pub struct RemoteConfig {
    #[serde(default)]
    pub api_version: ApiVersion,
    #[serde(default)]
    pub client_version: ClientVersion,
}

#[derive(Deserialize, Debug, Default)]
pub struct ApiVersion {
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub current: u32,
}

#[derive(Deserialize, Debug, Default)]
pub struct ClientVersion {
    #[serde(default)]
    pub latest: String,
    /// Versions that must be upgraded.
    #[serde(default)]
    pub update: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    UpdateAvailable { latest: String },
    UpdateRequired { latest: String },
}

/// Compare dotted versions numerically (`0.10.0 > 0.9.1`). A leading `v`
/// is ignored, missing components count as zero and non-numeric parts
/// compare as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn parts(v: &str) -> Vec<u64> {
        v.trim()
            .trim_start_matches(['v', 'V'])
            .split('.')
            .map(|p| p.trim().parse().unwrap_or(0))
            .collect()
    }
    let (a, b) = (parts(a), parts(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Decide what `current` should do given the published config.
pub fn evaluate(current: &str, config: &RemoteConfig) -> UpdateStatus {
    let latest = config.client_version.latest.clone();
    if config.client_version.update.iter().any(|v| v == current) {
        return UpdateStatus::UpdateRequired { latest };
    }
    if !latest.is_empty() && compare_versions(current, &latest) == Ordering::Less {
        return UpdateStatus::UpdateAvailable { latest };
    }
    UpdateStatus::UpToDate
}

/// Fetch the published config and evaluate `current` against it.
pub fn check(api: &ApiClient, current: &str) -> Result<UpdateStatus, ApiError> {
    let config: RemoteConfig = api.fetch_json(CONFIG_JSON_URL)?;
    Ok(evaluate(current, &config))
}
