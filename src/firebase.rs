//! Firebase password sign-in, used to authorize forwarded payloads.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{PipelineError, Result};

const SIGN_IN_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";

/// Service account credentials. Any of them may be missing from the
/// environment; that only fails once a token is actually requested.
#[derive(Debug, Clone, Default)]
pub struct FirebaseCredentials {
    pub email: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: Option<String>,
}

pub struct FirebaseAuth {
    credentials: FirebaseCredentials,
    client: reqwest::Client,
}

impl FirebaseAuth {
    pub fn new(credentials: FirebaseCredentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            credentials,
            client,
        })
    }

    fn complete_credentials(&self) -> Result<(&str, &str, &str)> {
        match (
            self.credentials.email.as_deref(),
            self.credentials.password.as_deref(),
            self.credentials.api_key.as_deref(),
        ) {
            (Some(email), Some(password), Some(key))
                if !email.is_empty() && !password.is_empty() && !key.is_empty() =>
            {
                Ok((email, password, key))
            }
            _ => {
                error!("Missing Firebase credentials in environment variables");
                Err(PipelineError::AuthenticationFailure(
                    "missing Firebase credentials".to_string(),
                ))
            }
        }
    }

    fn sign_in_request(&self, email: &str, password: &str, api_key: &str) -> RequestBuilder {
        self.client
            .post(SIGN_IN_URL)
            .query(&[("key", api_key)])
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
    }

    /// Sign in and return a fresh ID token. Tokens are not cached.
    pub async fn id_token(&self) -> Result<String> {
        let (email, password, api_key) = self.complete_credentials()?;

        let response = self
            .sign_in_request(email, password, api_key)
            .send()
            .await
            .map_err(|e| {
                error!("Error during Firebase authentication: {}", e);
                PipelineError::AuthenticationFailure(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Firebase authentication failed: {} - {}", status, body);
            return Err(PipelineError::AuthenticationFailure(format!(
                "sign-in rejected with {}",
                status
            )));
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::AuthenticationFailure(e.to_string()))?;

        let token = body.id_token.ok_or_else(|| {
            PipelineError::AuthenticationFailure("sign-in response had no idToken".to_string())
        })?;

        info!("Firebase authentication successful");
        Ok(token)
    }
}
