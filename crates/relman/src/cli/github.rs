//! GitHub contents API provider.
//!
//! Implements [`RemoteFileProvider`] with blocking `reqwest` calls against
//! `GET/PUT /repos/{owner}/{repo}/contents/{path}`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use relman_core::error::{RelmanError, Result};
use relman_core::sync::{
    BoxFuture, ContentEncoding, PutFile, RemoteError, RemoteFile, RemoteFileProvider, RemoteRef,
};

const API_VERSION: &str = "2022-11-28";

#[derive(Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: String,
    encoding: ContentEncoding,
    sha: String,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
    #[serde(default)]
    name: Option<String>,
}

/// Who a token belongs to and what it may do.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub login: String,
    pub name: Option<String>,
    /// Classic token scopes; `None` for fine-grained tokens
    pub scopes: Option<Vec<String>>,
}

/// Remote file provider backed by the GitHub REST API.
pub struct GitHubContents {
    client: Client,
    api_base_url: String,
}

impl GitHubContents {
    /// Create a provider authenticating with `token`.
    pub fn new(api_base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(API_VERSION),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| RelmanError::Unauthorized("token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| RelmanError::Remote(format!("could not create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up the token's owner via `GET /user`.
    pub fn token_info(&self) -> std::result::Result<TokenInfo, RemoteError> {
        let response = send(self.client.get(format!("{}/user", self.api_base_url)))?;
        let response = check(response)?;

        let scopes = response
            .headers()
            .get("x-oauth-scopes")
            .and_then(|v| v.to_str().ok())
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            });
        let user: UserResponse = parse(response)?;

        Ok(TokenInfo {
            login: user.login,
            name: user.name,
            scopes,
        })
    }

    fn contents_url(&self, target: &RemoteRef) -> String {
        let path = target
            .path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base_url,
            urlencoding::encode(&target.owner),
            urlencoding::encode(&target.repo),
            path
        )
    }

    fn read(&self, target: &RemoteRef) -> std::result::Result<RemoteFile, RemoteError> {
        log::debug!("GET contents of {}", target);
        let request = self
            .client
            .get(self.contents_url(target))
            .query(&[("ref", target.branch.as_str())]);
        let response = check(send(request)?)?;
        let body: ContentsResponse = parse(response)?;

        Ok(RemoteFile {
            content: body.content,
            encoding: body.encoding,
            sha: body.sha,
        })
    }

    fn write(&self, target: &RemoteRef, request: PutFile<'_>) -> std::result::Result<String, RemoteError> {
        log::debug!(
            "PUT contents of {} (base {})",
            target,
            request.base_sha.unwrap_or("none")
        );
        let mut body = serde_json::json!({
            "message": request.message,
            "content": STANDARD.encode(request.content),
            "branch": target.branch,
        });
        if let Some(sha) = request.base_sha {
            body["sha"] = serde_json::Value::String(sha.to_string());
        }

        let response = check(send(self.client.put(self.contents_url(target)).json(&body))?)?;
        let body: PutResponse = parse(response)?;
        Ok(body.content.sha)
    }
}

impl RemoteFileProvider for GitHubContents {
    fn name(&self) -> &str {
        "github"
    }

    fn get_file<'a>(
        &'a self,
        target: &'a RemoteRef,
    ) -> BoxFuture<'a, std::result::Result<RemoteFile, RemoteError>> {
        Box::pin(async move { self.read(target) })
    }

    fn put_file<'a>(
        &'a self,
        target: &'a RemoteRef,
        request: PutFile<'a>,
    ) -> BoxFuture<'a, std::result::Result<String, RemoteError>> {
        Box::pin(async move { self.write(target, request) })
    }
}

fn send(request: RequestBuilder) -> std::result::Result<Response, RemoteError> {
    request
        .header(USER_AGENT, concat!("relman/", env!("CARGO_PKG_VERSION")))
        .send()
        .map_err(|e| RemoteError::Transport(format!("could not reach GitHub: {}", e)))
}

fn check(response: Response) -> std::result::Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorResponse>()
        .map(|e| e.message)
        .unwrap_or_default();
    Err(classify(status, message))
}

/// Map a failed GitHub response to a provider error.
fn classify(status: StatusCode, message: String) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(message),
        StatusCode::FORBIDDEN => RemoteError::Forbidden(message),
        StatusCode::NOT_FOUND => RemoteError::NotFound,
        StatusCode::CONFLICT => RemoteError::Conflict,
        StatusCode::UNPROCESSABLE_ENTITY if message.to_lowercase().contains("sha") => {
            RemoteError::Conflict
        }
        _ => RemoteError::Status {
            code: status.as_u16(),
            message,
        },
    }
}

fn parse<T: serde::de::DeserializeOwned>(response: Response) -> std::result::Result<T, RemoteError> {
    response
        .json()
        .map_err(|e| RemoteError::Transport(format!("unexpected response from GitHub: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_conflicts() {
        assert_eq!(
            classify(StatusCode::CONFLICT, String::new()),
            RemoteError::Conflict
        );
        assert_eq!(
            classify(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid request.\n\n\"sha\" wasn't supplied.".to_string()
            ),
            RemoteError::Conflict
        );
        assert!(matches!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, "Invalid path".to_string()),
            RemoteError::Status { code: 422, .. }
        ));
    }

    #[test]
    fn test_classify_auth() {
        assert!(matches!(
            classify(StatusCode::UNAUTHORIZED, "Bad credentials".to_string()),
            RemoteError::Unauthorized(_)
        ));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, "Resource not accessible".to_string()),
            RemoteError::Forbidden(_)
        ));
        assert_eq!(
            classify(StatusCode::NOT_FOUND, "Not Found".to_string()),
            RemoteError::NotFound
        );
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        let provider = GitHubContents::new("https://api.github.com/", "ghp_test").unwrap();
        let target: RemoteRef = "acme/site:data/release notes.json".parse().unwrap();
        assert_eq!(
            provider.contents_url(&target),
            "https://api.github.com/repos/acme/site/contents/data/release%20notes.json"
        );
    }

    #[test]
    fn test_contents_response_shapes() {
        let body: ContentsResponse = serde_json::from_str(
            r#"{"name":"r.json","sha":"abc","content":"e30=\n","encoding":"base64"}"#,
        )
        .unwrap();
        assert_eq!(body.encoding, ContentEncoding::Base64);

        let body: ContentsResponse =
            serde_json::from_str(r#"{"sha":"abc","content":"","encoding":"none"}"#).unwrap();
        assert_eq!(body.encoding, ContentEncoding::None);
    }
}
