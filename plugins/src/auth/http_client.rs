use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taskboard_core::api::{AuthProvider, AuthSession, AuthUser, HttpBackendConfig, RemoteError};

use crate::http::{ensure_success, from_reqwest, read_json};

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Password sign-in against the hosted auth endpoint (`<base_url>/auth/v1`).
pub struct HttpAuthProvider {
    http: reqwest::Client,
    anon_key: String,
    url_token: String,
    url_logout: String,
}

impl HttpAuthProvider {
    pub fn new(cfg: &HttpBackendConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()?;
        let normalized = cfg.base_url.trim_end_matches('/');
        Ok(Self {
            http,
            anon_key: cfg.anon_key.clone(),
            url_token: format!("{}/auth/v1/token", normalized),
            url_logout: format!("{}/auth/v1/logout", normalized),
        })
    }

    fn apikey(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.anon_key.trim().is_empty() {
            req
        } else {
            req.header("apikey", &self.anon_key)
        }
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError> {
        let url = &self.url_token;
        tracing::debug!(target: "taskboard.auth", stage = "auth.http.sign_in.in", url = %url);
        let req = self
            .http
            .post(url)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password });
        let resp = self
            .apikey(req)
            .send()
            .await
            .map_err(|err| from_reqwest(err, url))?;
        let status = resp.status();
        let token: TokenResponse = read_json(resp).await?;
        tracing::debug!(
            target: "taskboard.auth",
            stage = "auth.http.sign_in.out",
            status = %status,
            user_id = %token.user.id
        );
        Ok(AuthSession {
            user: AuthUser {
                id: token.user.id,
                email: token.user.email.unwrap_or_else(|| email.to_string()),
            },
            access_token: token.access_token,
        })
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), RemoteError> {
        let url = &self.url_logout;
        tracing::debug!(target: "taskboard.auth", stage = "auth.http.sign_out.in", url = %url);
        let req = self.http.post(url).bearer_auth(&session.access_token);
        let resp = self
            .apikey(req)
            .send()
            .await
            .map_err(|err| from_reqwest(err, url))?;
        let status = resp.status();
        ensure_success(resp).await?;
        tracing::debug!(target: "taskboard.auth", stage = "auth.http.sign_out.out", status = %status);
        Ok(())
    }
}
