// API client module: a small blocking HTTP client for the Slyft REST
// service. Authenticated calls carry the three session headers
// (`access-token`, `client`, `uid`) issued by the auth endpoints.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    ApiModel, Asset, AssetName, AssetParam, Auth, Credentials, Job, JobKind, JobParam,
    LoginErrorBody, Project, ProjectParam, RegistrationErrorBody, Terms,
};

/// Production backend, used when `SLYFTBACKEND` is not set.
pub const DEFAULT_BACKEND_URL: &str = "https://api.slyft.io/";
/// Environment variable overriding the backend base URL.
pub const BACKEND_ENV: &str = "SLYFTBACKEND";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const HEADER_ACCESS_TOKEN: &str = "access-token";
const HEADER_CLIENT: &str = "client";
const HEADER_UID: &str = "uid";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("you do not seem to be logged in, please run `slyft user login`")]
    NotLoggedIn,
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server answered {status} (expected {expected}): {body}")]
    UnexpectedStatus {
        status: StatusCode,
        expected: StatusCode,
        body: String,
    },
    #[error("server refused the request ({status})")]
    Rejected {
        status: StatusCode,
        messages: Vec<String>,
    },
    #[error("could not decode server response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid session header: {0}")]
    Header(#[from] InvalidHeaderValue),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which auth endpoint produced a rejection; the error bodies differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    Register,
    Login,
}

impl AuthFlow {
    fn endpoint(self) -> &'static str {
        match self {
            AuthFlow::Register => "/auth",
            AuthFlow::Login => "/auth/sign_in",
        }
    }
}

/// Blocking client holding the reqwest client, the backend base URL and
/// the session used for authenticated calls.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Option<Auth>,
}

impl ApiClient {
    /// Create a client for the backend named by `SLYFTBACKEND`, falling back
    /// to the production backend.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var(BACKEND_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.into());
        Self::new(&base_url)
    }

    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
        Ok(ApiClient {
            client,
            base_url: base_url.to_string(),
            auth: None,
        })
    }

    /// Use `auth` for subsequent authenticated requests. Incomplete
    /// sessions are ignored.
    pub fn set_auth(&mut self, auth: Auth) {
        self.auth = auth.is_complete().then_some(auth);
    }

    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of `endpoint` on the backend.
    pub fn url(&self, endpoint: &str) -> String {
        join_url(&self.base_url, endpoint)
    }

    fn auth_headers(&self) -> Result<HeaderMap, ApiError> {
        let auth = self.auth.as_ref().ok_or(ApiError::NotLoggedIn)?;
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_ACCESS_TOKEN, HeaderValue::from_str(&auth.access_token)?);
        headers.insert(HEADER_CLIENT, HeaderValue::from_str(&auth.client)?);
        headers.insert(HEADER_UID, HeaderValue::from_str(&auth.uid)?);
        Ok(headers)
    }

    fn send(&self, url: &str, req: RequestBuilder) -> Result<Response, ApiError> {
        let res = req.send().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        debug!(url, status = %res.status(), "response");
        Ok(res)
    }

    /// Authenticated request with an optional JSON body.
    fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let url = self.url(endpoint);
        debug!(%method, url, "request");
        let mut req = self
            .client
            .request(method, &url)
            .headers(self.auth_headers()?);
        if let Some(body) = body {
            req = req.json(body);
        }
        self.send(&url, req)
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let res = self.request::<()>(Method::GET, endpoint, None)?;
        decode(expect_status(res, StatusCode::OK)?)
    }

    fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let res = self.request(Method::POST, endpoint, Some(body))?;
        decode(expect_status(res, StatusCode::CREATED)?)
    }

    /// Register or log in. On success returns the session from the response
    /// headers; the caller decides where to keep it.
    pub fn authenticate(&self, flow: AuthFlow, creds: &Credentials) -> Result<Auth, ApiError> {
        let url = self.url(flow.endpoint());
        debug!(url, ?flow, "authenticating");
        let res = self.send(&url, self.client.post(&url).json(creds))?;
        let status = res.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            return Ok(auth_from_headers(res.headers()));
        }
        let body = read_body(res)?;
        debug!(body = %String::from_utf8_lossy(&body), "authentication refused");
        Err(ApiError::Rejected {
            status,
            messages: rejection_messages(flow, &body),
        })
    }

    /// DELETE an auth endpoint (`/auth/sign_out`, `/auth`). Accepts 200 and
    /// 204.
    pub fn end_session(&self, endpoint: &str) -> Result<(), ApiError> {
        let res = self.request::<()>(Method::DELETE, endpoint, None)?;
        let status = res.status();
        if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            return Ok(());
        }
        Err(unexpected(res, StatusCode::NO_CONTENT))
    }

    /// URL of the current terms and conditions document.
    pub fn terms_url(&self) -> Result<String, ApiError> {
        let url = self.url("/terms");
        let res = self.send(&url, self.client.get(&url))?;
        let terms: Terms = decode(expect_status(res, StatusCode::OK)?)?;
        Ok(terms.url)
    }

    /// GET an absolute URL and return its body as text.
    pub fn fetch_text(&self, url: &str) -> Result<String, ApiError> {
        let res = self.send(url, self.client.get(url))?;
        let res = expect_status(res, StatusCode::OK)?;
        res.text().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })
    }

    /// GET an absolute URL and decode its JSON body. 200 and 204 count as
    /// success.
    pub fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let res = self.send(url, self.client.get(url))?;
        if res.status() == StatusCode::NO_CONTENT {
            return decode_bytes(b"{}");
        }
        decode(expect_status(res, StatusCode::OK)?)
    }

    /// Server liveness check.
    pub fn ping(&self) -> Result<String, ApiError> {
        self.fetch_text(&self.url("/_ping"))
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get_json("/v1/projects")
    }

    pub fn create_project(&self, name: &str, details: &str) -> Result<Project, ApiError> {
        self.post_json("/v1/projects", &ProjectParam::new(name, details))
    }

    /// Assets under `endpoint` (`/v1/assets` or a project's assets URL).
    pub fn list_assets(&self, endpoint: &str) -> Result<Vec<Asset>, ApiError> {
        self.get_json(endpoint)
    }

    pub fn create_asset(&self, project: &Project, param: &AssetParam) -> Result<Asset, ApiError> {
        self.post_json(&project.assets_url(), param)
    }

    /// Request an asset's stored content. The response is only handed back
    /// once the server has answered 200; its body is read by the caller.
    pub fn fetch_asset(&self, project: &Project, name: &str) -> Result<Response, ApiError> {
        let body = AssetName {
            asset_name: name.to_string(),
        };
        let res = self.request(Method::GET, &project.assetstore_url(), Some(&body))?;
        expect_status(res, StatusCode::OK)
    }

    /// Jobs under `endpoint` (`/v1/jobs` or a project's jobs URL).
    pub fn list_jobs(&self, endpoint: &str) -> Result<Vec<Job>, ApiError> {
        self.get_json(endpoint)
    }

    pub fn create_job(&self, kind: JobKind, project: &Project) -> Result<Job, ApiError> {
        self.post_json(&project.jobs_url(), &JobParam::new(kind, project))
    }

    pub fn get_job(&self, job: &Job) -> Result<Job, ApiError> {
        self.get_json(&job.endpoint())
    }

    /// DELETE any model; the server answers 204.
    pub fn delete(&self, model: &dyn ApiModel) -> Result<(), ApiError> {
        let res = self.request::<()>(Method::DELETE, &model.endpoint(), None)?;
        expect_status(res, StatusCode::NO_CONTENT).map(|_| ())
    }
}

/// Join a base URL and an endpoint path with exactly one `/` between them.
pub fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

fn auth_from_headers(headers: &HeaderMap) -> Auth {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    Auth {
        access_token: get(HEADER_ACCESS_TOKEN),
        client: get(HEADER_CLIENT),
        uid: get(HEADER_UID),
    }
}

/// Human-readable messages from a refused register/login body. Bodies that
/// do not decode yield no messages.
pub fn rejection_messages(flow: AuthFlow, body: &[u8]) -> Vec<String> {
    match flow {
        AuthFlow::Register => serde_json::from_slice::<RegistrationErrorBody>(body)
            .map(RegistrationErrorBody::into_messages)
            .unwrap_or_default(),
        AuthFlow::Login => serde_json::from_slice::<LoginErrorBody>(body)
            .map(|b| b.errors)
            .unwrap_or_default(),
    }
}

fn read_body(res: Response) -> Result<Vec<u8>, ApiError> {
    let url = res.url().to_string();
    res.bytes()
        .map(|b| b.to_vec())
        .map_err(|source| ApiError::Transport { url, source })
}

fn unexpected(res: Response, expected: StatusCode) -> ApiError {
    let status = res.status();
    let body = res.text().unwrap_or_default();
    ApiError::UnexpectedStatus {
        status,
        expected,
        body,
    }
}

fn expect_status(res: Response, expected: StatusCode) -> Result<Response, ApiError> {
    if res.status() == expected {
        Ok(res)
    } else {
        Err(unexpected(res, expected))
    }
}

fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ApiError> {
    let body = read_body(res)?;
    debug!(body = %String::from_utf8_lossy(&body), "decoding response");
    decode_bytes(&body)
}

fn decode_bytes<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}
