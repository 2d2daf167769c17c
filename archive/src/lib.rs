pub mod auth;
pub mod session;

const HTTP_TIMEOUT_SECS: u64 = 10;

pub(crate) fn http_client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(concat!("ia-configure/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

pub(crate) fn service_url(host: &str, path: &str) -> anyhow::Result<url::Url> {
    Ok(url::Url::parse(&format!("https://{}/", host))?.join(path)?)
}
