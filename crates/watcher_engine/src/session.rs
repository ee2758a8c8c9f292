use serde::Deserialize;
use thiserror::Error;
use url::Url;
use watch_logging::watch_info;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("network error during login: {0}")]
    Network(String),
    #[error("malformed login response: {0}")]
    Protocol(String),
    #[error("login rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    query: TokenQuery,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    tokens: Tokens,
}

#[derive(Debug, Deserialize)]
struct Tokens {
    logintoken: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    login: LoginResult,
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    result: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Establishes a login session against the MediaWiki API, leaving the
/// session cookies in the client's cookie store.
///
/// Two steps: fetch a login token, then post the credentials with it.
/// Failure here is fatal at startup; the poll loop never starts without a
/// session.
pub async fn login(
    client: &reqwest::Client,
    api_url: &Url,
    username: &str,
    password: &str,
) -> Result<(), AuthError> {
    let token: TokenResponse = client
        .get(api_url.clone())
        .query(&[
            ("action", "query"),
            ("meta", "tokens"),
            ("type", "login"),
            ("format", "json"),
        ])
        .send()
        .await
        .map_err(|err| AuthError::Network(err.to_string()))?
        .json()
        .await
        .map_err(|err| AuthError::Protocol(err.to_string()))?;

    let response: LoginResponse = client
        .post(api_url.clone())
        .form(&[
            ("action", "login"),
            ("lgname", username),
            ("lgpassword", password),
            ("lgtoken", &token.query.tokens.logintoken),
            ("format", "json"),
        ])
        .send()
        .await
        .map_err(|err| AuthError::Network(err.to_string()))?
        .json()
        .await
        .map_err(|err| AuthError::Protocol(err.to_string()))?;

    if response.login.result != "Success" {
        let reason = response
            .login
            .reason
            .unwrap_or_else(|| response.login.result.clone());
        return Err(AuthError::Rejected(reason));
    }

    watch_info!("Logged in to {} as {}", api_url, username);
    Ok(())
}
