// Wire models for the Slyft REST API. Field names follow the server's JSON;
// every entity can describe itself as key/value rows for the markdown
// renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Something the server exposes under its own URL and that can be deleted
/// through the generic confirm-then-DELETE flow.
pub trait ApiModel {
    fn endpoint(&self) -> String;
    fn name(&self) -> &str;
}

/// Session headers returned by the auth endpoints and echoed on every
/// authenticated request.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Auth {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub uid: String,
}

impl Auth {
    /// All three session values are present.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.client.is_empty() && !self.uid.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TermsAcceptance {
    pub accepted: bool,
    pub timestamp: String,
}

/// Payload for `/auth` (register) and `/auth/sign_in` (login).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(rename = "terms")]
    pub terms_acceptance: TermsAcceptance,
}

/// Answer of `/terms`: where the current terms document lives.
#[derive(Deserialize, Debug, Clone)]
pub struct Terms {
    pub url: String,
}

/// Error body of a failed registration. Every level is optional; an
/// absent field simply means the server gave no messages.
#[derive(Deserialize, Debug, Default)]
pub struct RegistrationErrorBody {
    #[serde(default)]
    pub errors: Option<RegistrationErrors>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RegistrationErrors {
    #[serde(default)]
    pub full_messages: Option<Vec<String>>,
}

impl RegistrationErrorBody {
    pub fn into_messages(self) -> Vec<String> {
        self.errors
            .and_then(|e| e.full_messages)
            .unwrap_or_default()
    }
}

/// Error body of a failed login.
#[derive(Deserialize, Debug, Default)]
pub struct LoginErrorBody {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub details: String,
    pub settings: Option<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn assets_url(&self) -> String {
        format!("{}/assets", self.endpoint())
    }

    pub fn assetstore_url(&self) -> String {
        format!("{}/assetstore", self.endpoint())
    }

    pub fn jobs_url(&self) -> String {
        format!("{}/jobs", self.endpoint())
    }

    pub fn detail_rows(&self) -> Vec<Vec<String>> {
        vec![
            row("Key", "Value"),
            row("Name", &self.name),
            row("Details", &self.details),
            row("Settings", self.settings.as_deref().unwrap_or("")),
            row("CreatedAt", &self.created_at.to_string()),
            row("UpdatedAt", &self.updated_at.to_string()),
        ]
    }
}

impl ApiModel for Project {
    fn endpoint(&self) -> String {
        format!("/v1/projects/{}", self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// `{"project": {...}}` envelope for project creation.
#[derive(Serialize, Debug)]
pub struct ProjectParam {
    pub project: NewProject,
}

#[derive(Serialize, Debug)]
pub struct NewProject {
    pub name: String,
    pub details: String,
}

impl ProjectParam {
    pub fn new(name: &str, details: &str) -> Self {
        ProjectParam {
            project: NewProject {
                name: name.trim().to_string(),
                details: details.trim().to_string(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub project_id: i64,
    pub project_name: String,
    pub origin: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    pub fn detail_rows(&self) -> Vec<Vec<String>> {
        vec![
            row("Key", "Value"),
            row("Name", &self.name),
            row("ProjectId", &self.project_id.to_string()),
            row("ProjectName", &self.project_name),
            row("Origin", &self.origin),
            row("CreatedAt", &self.created_at.to_string()),
            row("UpdatedAt", &self.updated_at.to_string()),
        ]
    }
}

impl ApiModel for Asset {
    fn endpoint(&self) -> String {
        format!("/v1/projects/{}/assets/{}", self.project_id, self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// `{"asset": {"name", "asset"}}` upload envelope. `asset` holds a
/// `data:<mime>;base64,<content>` URL.
#[derive(Serialize, Debug)]
pub struct AssetParam {
    pub asset: AssetPost,
}

#[derive(Serialize, Debug)]
pub struct AssetPost {
    pub name: String,
    pub asset: String,
}

impl AssetParam {
    pub fn new(name: &str, mime_type: &str, content: &[u8]) -> Self {
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        AssetParam {
            asset: AssetPost {
                name: name.to_string(),
                asset: format!("data:{mime_type};base64,{encoded}"),
            },
        }
    }
}

/// Body of an assetstore download request.
#[derive(Serialize, Debug)]
pub struct AssetName {
    pub asset_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct JobResults {
    #[serde(rename = "resultMessage")]
    pub result_message: String,
    #[serde(rename = "resultStatus")]
    pub result_status: i64,
    #[serde(rename = "resultAssets")]
    pub result_assets: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Job {
    pub id: i64,
    pub kind: String,
    pub status: String,
    pub results: JobResults,
    pub project_id: i64,
    pub project_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn detail_rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![
            row("Key", "Value"),
            row("Id", &self.id.to_string()),
            row("Kind", &self.kind),
            row("Status", &self.status),
            row("ProjectId", &self.project_id.to_string()),
            row("ProjectName", &self.project_name),
            row("CreatedAt", &self.created_at.to_string()),
            row("UpdatedAt", &self.updated_at.to_string()),
            row("ResultMessage", &self.results.result_message),
            row("ResultStatus", &self.results.result_status.to_string()),
        ];
        for (index, asset) in self.results.result_assets.iter().enumerate() {
            rows.push(row(&format!("ResultAssets[{index}]"), asset));
        }
        rows
    }
}

impl ApiModel for Job {
    fn endpoint(&self) -> String {
        format!("/v1/projects/{}/jobs/{}", self.project_id, self.id)
    }

    fn name(&self) -> &str {
        &self.kind
    }
}

/// Kind of server-side job a project can be submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Build,
    Validate,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Build => "build",
            JobKind::Validate => "validate",
        }
    }
}

/// `{"job": {"kind", "project_id"}}` envelope for job submission.
#[derive(Serialize, Debug)]
pub struct JobParam {
    pub job: NewJob,
}

#[derive(Serialize, Debug)]
pub struct NewJob {
    pub kind: String,
    pub project_id: i64,
}

impl JobParam {
    pub fn new(kind: JobKind, project: &Project) -> Self {
        JobParam {
            job: NewJob {
                kind: kind.as_str().to_string(),
                project_id: project.id,
            },
        }
    }
}

fn row(key: &str, value: &str) -> Vec<String> {
    vec![key.to_string(), value.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_param_trims_input() {
        let param = ProjectParam::new("  TestName\n", "TestDetails\n");
        assert_eq!(
            serde_json::to_value(&param).unwrap(),
            json!({"project": {"name": "TestName", "details": "TestDetails"}})
        );
    }

    #[test]
    fn project_urls() {
        let p = Project {
            id: 7,
            ..Project::default()
        };
        assert_eq!(p.endpoint(), "/v1/projects/7");
        assert_eq!(p.assets_url(), "/v1/projects/7/assets");
        assert_eq!(p.assetstore_url(), "/v1/projects/7/assetstore");
        assert_eq!(p.jobs_url(), "/v1/projects/7/jobs");
    }

    #[test]
    fn asset_param_builds_data_url() {
        let param = AssetParam::new("api.yaml", "application/x-yaml", b"a: 1");
        assert_eq!(param.asset.name, "api.yaml");
        assert_eq!(param.asset.asset, "data:application/x-yaml;base64,YTogMQ==");
    }

    #[test]
    fn job_decodes_server_shape() {
        let job: Job = serde_json::from_value(json!({
            "id": 3,
            "kind": "build",
            "status": "done",
            "project_id": 7,
            "project_name": "demo",
            "results": {"resultMessage": "ok", "resultStatus": 0, "resultAssets": ["a.zip", "b.zip"]},
            "created_at": "2017-03-01T10:00:00Z",
            "updated_at": "2017-03-01T10:05:00Z"
        }))
        .unwrap();
        assert_eq!(job.endpoint(), "/v1/projects/7/jobs/3");
        let rows = job.detail_rows();
        assert_eq!(rows.last().unwrap(), &vec!["ResultAssets[1]".to_string(), "b.zip".to_string()]);
    }

    #[test]
    fn job_param_carries_kind_and_project() {
        let p = Project {
            id: 9,
            ..Project::default()
        };
        assert_eq!(
            serde_json::to_value(JobParam::new(JobKind::Validate, &p)).unwrap(),
            json!({"job": {"kind": "validate", "project_id": 9}})
        );
    }

    #[test]
    fn registration_errors_tolerate_missing_fields() {
        let body: RegistrationErrorBody = serde_json::from_value(json!({})).unwrap();
        assert!(body.into_messages().is_empty());

        let body: RegistrationErrorBody =
            serde_json::from_value(json!({"errors": {"status": "error"}})).unwrap();
        assert!(body.into_messages().is_empty());

        let body: RegistrationErrorBody = serde_json::from_value(
            json!({"errors": {"full_messages": ["Email has already been taken"]}}),
        )
        .unwrap();
        assert_eq!(body.into_messages(), vec!["Email has already been taken"]);
    }

    #[test]
    fn credentials_serialize_terms_under_terms_key() {
        let creds = Credentials {
            email: "foo@bar.boo".into(),
            ..Credentials::default()
        };
        let value = serde_json::to_value(&creds).unwrap();
        assert_eq!(value["terms"]["accepted"], json!(false));
    }

    #[test]
    fn auth_completeness() {
        assert!(!Auth::default().is_complete());
        let auth = Auth {
            access_token: "t".into(),
            client: "c".into(),
            uid: "u".into(),
        };
        assert!(auth.is_complete());
    }
}
