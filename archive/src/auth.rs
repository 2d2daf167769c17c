use crate::{http_client, service_url};
use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use file_manager::ia_config::IaConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The credential exchange was rejected by archive.org. The message is meant for the user.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct AuthenticationError(pub String);

#[derive(Deserialize, Debug, Default)]
struct XauthnResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    values: Option<XauthnValues>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct XauthnValues {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    s3: Option<S3Keys>,
    #[serde(default)]
    cookies: HashMap<String, String>,
    #[serde(default)]
    screenname: Option<String>,
}

#[derive(Deserialize, Debug)]
struct S3Keys {
    access: String,
    secret: String,
}

/// Exchanges an archive.org email and password for IA-S3 keys and logged-in cookies,
/// merges them into `config_file` and returns the path written.
///
/// Missing credentials are prompted for on the terminal.
pub fn configure(
    username: Option<&str>,
    password: Option<&str>,
    config_file: &Path,
    host: &str,
) -> Result<PathBuf> {
    let username = match username.filter(|u| !u.is_empty()) {
        Some(username) => username.to_owned(),
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Email address")
            .interact_text()?,
    };

    let password = match password.filter(|p| !p.is_empty()) {
        Some(password) => password.to_owned(),
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password")
            .interact()?,
    };

    let auth_config = get_auth_config(&username, &password, host)?;

    let mut config = IaConfig::read_file(config_file)?;
    config.merge(auth_config);
    config.write(config_file)?;

    Ok(config_file.to_path_buf())
}

fn get_auth_config(email: &str, password: &str, host: &str) -> Result<IaConfig> {
    let url = service_url(host, "services/xauthn/")?;

    info!("Authenticating {} against {}", email, host);

    let response: XauthnResponse = http_client()?
        .post(url)
        .query(&[("op", "login")])
        .form(&[("email", email), ("password", password)])
        .send()?
        .json()?;

    auth_config_from_response(response)
}

fn auth_config_from_response(response: XauthnResponse) -> Result<IaConfig> {
    if !response.success {
        let reason = response
            .values
            .as_ref()
            .and_then(|v| v.reason.clone())
            .or(response.error)
            .unwrap_or_else(|| "unknown error".to_owned());

        debug!("xauthn login rejected: {}", reason);

        let message = match reason.as_str() {
            "account_not_found" => "Account not found, check your email and try again.".to_owned(),
            "account_bad_password" => "Incorrect password, try again.".to_owned(),
            other => format!("Authentication failed: {}", other),
        };
        return Err(AuthenticationError(message).into());
    }

    let values = response.values.unwrap_or_default();
    let s3 = values
        .s3
        .ok_or_else(|| AuthenticationError("Authentication failed: no IA-S3 keys returned".to_owned()))?;

    let mut config = IaConfig::default();
    config.upsert("s3", "access", &s3.access);
    config.upsert("s3", "secret", &s3.secret);
    for cookie in ["logged-in-user", "logged-in-sig"] {
        if let Some(value) = values.cookies.get(cookie) {
            config.upsert("cookies", cookie, value);
        }
    }
    if let Some(screenname) = &values.screenname {
        config.upsert("general", "screenname", screenname);
    }

    Ok(config)
}
