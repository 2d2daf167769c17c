use crate::{http_client, service_url};
use anyhow::Result;
use file_manager::ia_config::IaConfig;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Response of `services/user.php?op=whoami`.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Whoami {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub value: Option<WhoamiValue>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WhoamiValue {
    #[serde(default)]
    pub username: Option<String>,
}

impl Whoami {
    /// The username, only when the service reported success.
    pub fn username(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.value.as_ref()?.username.as_deref()
    }
}

pub struct ArchiveSession {
    config: Map<String, Value>,
    s3_keys: Option<(String, String)>,
    config_file: PathBuf,
    host: String,
    client: Client,
}

impl ArchiveSession {
    pub fn new(config_file: Option<&Path>, host: &str) -> Result<Self> {
        let config_file = IaConfig::file_path(config_file)?;
        let ia_config = IaConfig::read_file(&config_file)?;

        let s3_keys = match (ia_config.get("s3", "access"), ia_config.get("s3", "secret")) {
            (Some(access), Some(secret)) => Some((access.to_owned(), secret.to_owned())),
            _ => None,
        };

        Ok(Self {
            config: ia_config.to_json(),
            s3_keys,
            config_file,
            host: host.to_owned(),
            client: http_client()?,
        })
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn whoami(&self) -> Result<Whoami> {
        let url = service_url(&self.host, "services/user.php")?;
        let mut request = self.client.get(url).query(&[("op", "whoami")]);

        match &self.s3_keys {
            Some((access, secret)) => {
                request = request.header("Authorization", format!("LOW {}:{}", access, secret));
            }
            None => debug!("No IA-S3 keys configured, calling whoami anonymously"),
        }

        let whoami: Whoami = request.send()?.json()?;
        debug!("whoami success: {}", whoami.success);

        Ok(whoami)
    }
}
