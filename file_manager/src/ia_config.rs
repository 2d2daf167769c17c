use crate::serde_support::{deserialize_sections, serialize_write_ordered, Sections};
use anyhow::{anyhow, Context, Result};
use directories::UserDirs;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The `ia` INI config: `[s3]` keys, `[cookies]`, `[general]` and any user sections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IaConfig {
    pub sections: Sections,
}

impl IaConfig {
    /// Resolves the config file to use. An explicit path always wins, otherwise the
    /// first existing candidate is used, falling back to the XDG location for new files.
    pub fn file_path(config_file: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = config_file {
            return Ok(path.to_path_buf());
        }

        let user_dirs = UserDirs::new().ok_or_else(|| anyhow!("Unable to get user directories"))?;
        let xdg_config_home = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let candidates = Self::candidates(user_dirs.home_dir(), xdg_config_home);
        let path = candidates
            .iter()
            .find(|p| p.is_file())
            .unwrap_or(&candidates[0])
            .to_owned();

        debug!("Using ia config file: {}", path.display());

        Ok(path)
    }

    fn candidates(home: &Path, xdg_config_home: Option<PathBuf>) -> Vec<PathBuf> {
        let config_home = xdg_config_home.unwrap_or_else(|| home.join(".config"));
        vec![
            config_home.join("internetarchive").join("ia.ini"),
            home.join(".config").join("ia.ini"),
            home.join(".ia"),
        ]
    }

    /// Reads the config at `path`. A missing file is an empty config.
    pub fn read_file(path: &Path) -> Result<IaConfig> {
        if !path.exists() {
            debug!("ia config file {} does not exist yet", path.display());
            return Ok(IaConfig::default());
        }

        let sections = deserialize_sections(path)
            .with_context(|| format!("unable to parse ia config file {}", path.display()))?;

        Ok(IaConfig { sections })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        serialize_write_ordered(&self.sections, path)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    pub fn upsert(&mut self, section: &str, key: &str, value: &str) {
        let _ = self
            .sections
            .entry(section.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
    }

    /// Overlays `other` onto `self` key by key; keys only present in `self` survive.
    pub fn merge(&mut self, other: IaConfig) {
        for (name, section) in other.sections {
            self.sections.entry(name).or_default().extend(section);
        }
    }

    pub fn to_json(&self) -> Map<String, Value> {
        self.sections
            .iter()
            .map(|(name, section)| {
                let values = section
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                (name.clone(), Value::Object(values))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = IaConfig::file_path(Some(Path::new("/tmp/custom.ini"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.ini"));
    }

    #[test]
    fn candidates_prefer_xdg_config_home() {
        let candidates =
            IaConfig::candidates(Path::new("/home/a"), Some(PathBuf::from("/xdg")));
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/xdg/internetarchive/ia.ini"),
                PathBuf::from("/home/a/.config/ia.ini"),
                PathBuf::from("/home/a/.ia"),
            ]
        );
    }

    #[test]
    fn candidates_default_to_dot_config() {
        let candidates = IaConfig::candidates(Path::new("/home/a"), None);
        assert_eq!(
            candidates[0],
            PathBuf::from("/home/a/.config/internetarchive/ia.ini")
        );
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = IaConfig::read_file(&dir.path().join("nope.ini")).unwrap();
        assert!(config.sections.is_empty());
    }

    #[test]
    fn reads_config_parser_style_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ia.ini");
        fs::write(
            &path,
            "[s3]\naccess = key\nsecret = shh\n\n[cookies]\nlogged-in-user = alice\n",
        )
        .unwrap();

        let config = IaConfig::read_file(&path).unwrap();

        assert_eq!(config.get("s3", "access"), Some("key"));
        assert_eq!(config.get("s3", "secret"), Some("shh"));
        assert_eq!(config.get("cookies", "logged-in-user"), Some("alice"));
        assert_eq!(config.get("cookies", "logged-in-sig"), None);
    }

    #[test]
    fn colon_separated_values_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ia.ini");
        fs::write(&path, "[s3]\naccess: key\n").unwrap();

        let err = IaConfig::read_file(&path).unwrap_err();

        assert!(format!("{:#}", err)
            .starts_with(&format!("unable to parse ia config file {}: ", path.display())));
    }

    #[test]
    fn merge_keeps_unrelated_sections_and_keys() {
        let mut existing = IaConfig::default();
        existing.upsert("s3", "access", "old");
        existing.upsert("s3", "extra", "kept");
        existing.upsert("custom", "option", "1");

        let mut update = IaConfig::default();
        update.upsert("s3", "access", "new");
        update.upsert("general", "screenname", "alice");

        existing.merge(update);

        assert_eq!(existing.get("s3", "access"), Some("new"));
        assert_eq!(existing.get("s3", "extra"), Some("kept"));
        assert_eq!(existing.get("custom", "option"), Some("1"));
        assert_eq!(existing.get("general", "screenname"), Some("alice"));
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("internetarchive").join("ia.ini");
        let mut config = IaConfig::default();
        config.upsert("general", "screenname", "alice");

        config.write(&path).unwrap();

        assert_eq!(IaConfig::read_file(&path).unwrap(), config);
    }

    #[test]
    fn to_json_nests_sections() {
        let mut config = IaConfig::default();
        config.upsert("s3", "secret", "shh");

        let json = config.to_json();

        assert_eq!(json["s3"]["secret"], Value::String("shh".to_owned()));
    }
}
