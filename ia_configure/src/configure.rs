use crate::error::{ConfigureError, MissingCookie};
use crate::json::redacted_config;
use anyhow::Result;
use archive::session::{ArchiveSession, Whoami};
use file_manager::netrc::Netrc;
use serde_json::{Map, Value};
use shared::args::ConfigureArgs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The netrc machine entry credentials are read from.
const NETRC_MACHINE: &str = "archive.org";

pub trait Session {
    fn config(&self) -> &Map<String, Value>;
    fn config_file(&self) -> &Path;
    fn host(&self) -> &str;
    fn whoami(&self) -> Result<Whoami>;
}

pub trait Configurator {
    /// Exchanges credentials, writes them to `config_file` and returns the path written.
    /// Missing credentials are prompted for.
    fn configure(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        config_file: &Path,
        host: &str,
    ) -> Result<PathBuf>;
}

impl Session for ArchiveSession {
    fn config(&self) -> &Map<String, Value> {
        ArchiveSession::config(self)
    }

    fn config_file(&self) -> &Path {
        ArchiveSession::config_file(self)
    }

    fn host(&self) -> &str {
        ArchiveSession::host(self)
    }

    fn whoami(&self) -> Result<Whoami> {
        ArchiveSession::whoami(self)
    }
}

pub struct ArchiveConfigurator;

impl Configurator for ArchiveConfigurator {
    fn configure(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        config_file: &Path,
        host: &str,
    ) -> Result<PathBuf> {
        archive::auth::configure(username, password, config_file, host)
    }
}

pub struct ConfigureCommand<'a, S, C> {
    pub session: &'a S,
    pub configurator: &'a C,
    /// Overrides the `$NETRC` / `~/.netrc` lookup.
    pub netrc_path: Option<PathBuf>,
}

impl<'a, S: Session, C: Configurator> ConfigureCommand<'a, S, C> {
    /// Runs one action and reports its outcome, returning the process exit code.
    pub fn run(&self, args: &ConfigureArgs, out: &mut impl Write, err: &mut impl Write) -> u8 {
        match self.execute(args, out, err) {
            Ok(()) => 0,
            Err(e) => {
                debug!("ia configure failed: {:?}", e);
                // Nothing left to report to if the streams themselves are gone.
                let _ = if e.is_stdout() {
                    writeln!(out, "{}", e)
                } else {
                    writeln!(err, "{}", e)
                };
                1
            }
        }
    }

    fn execute(
        &self,
        args: &ConfigureArgs,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> Result<(), ConfigureError> {
        if args.print_cookies {
            return self.print_cookies(out);
        }
        if args.show {
            return self.show(out);
        }
        if args.check {
            return self.check(out);
        }
        if args.netrc {
            return self.configure_from_netrc(err);
        }
        self.configure_interactive(args, out)
    }

    fn print_cookies(&self, out: &mut impl Write) -> Result<(), ConfigureError> {
        let cookie = |name: &str| {
            self.session
                .config()
                .get("cookies")
                .and_then(|c| c.get(name))
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())
        };
        let (user, sig) = MissingCookie::require(cookie("logged-in-user"), cookie("logged-in-sig"))
            .map_err(ConfigureError::MissingCookie)?;

        writeln!(out, "logged-in-user={}; logged-in-sig={}", user, sig)?;
        Ok(())
    }

    fn show(&self, out: &mut impl Write) -> Result<(), ConfigureError> {
        let redacted = redacted_config(self.session.config());
        writeln!(out, "{}", serde_json::to_string_pretty(&redacted)?)?;
        Ok(())
    }

    fn check(&self, out: &mut impl Write) -> Result<(), ConfigureError> {
        let whoami = match self.session.whoami() {
            Ok(whoami) => whoami,
            Err(e) => {
                debug!("whoami request failed: {:#}", e);
                return Err(ConfigureError::InvalidCredentials);
            }
        };

        match whoami.username() {
            Some(user) => {
                writeln!(out, "The credentials for \"{}\" are valid", user)?;
                Ok(())
            }
            None => {
                debug!("whoami rejected the configured keys: {:?}", whoami);
                Err(ConfigureError::InvalidCredentials)
            }
        }
    }

    fn configure_from_netrc(&self, err: &mut impl Write) -> Result<(), ConfigureError> {
        writeln!(err, "Configuring 'ia' with netrc file...")?;

        let netrc_path = match &self.netrc_path {
            Some(path) => path.clone(),
            None => Netrc::file_path()?,
        };
        let netrc = Netrc::read_private_file(&netrc_path)?;
        let entry = netrc
            .host(NETRC_MACHINE)
            .ok_or_else(|| ConfigureError::NetrcHostNotFound(NETRC_MACHINE.to_owned()))?;

        info!("Using {} credentials from {}", NETRC_MACHINE, netrc_path.display());

        let config_file_path = self.configurator.configure(
            entry.login.as_deref(),
            Some(entry.password.as_deref().unwrap_or("")),
            self.session.config_file(),
            self.session.host(),
        )?;

        writeln!(err, "Config saved to: {}", config_file_path.display())?;
        Ok(())
    }

    fn configure_interactive(
        &self,
        args: &ConfigureArgs,
        out: &mut impl Write,
    ) -> Result<(), ConfigureError> {
        let supplied = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        let prompting = !(supplied(&args.username) && supplied(&args.password));

        if prompting {
            writeln!(
                out,
                "Enter your Archive.org credentials below to configure 'ia'.\n"
            )?;
            out.flush()?;
        }

        let config_file_path = self.configurator.configure(
            args.username.as_deref(),
            args.password.as_deref(),
            self.session.config_file(),
            self.session.host(),
        )?;

        let saved = format!("Config saved to: {}", config_file_path.display());
        if prompting {
            writeln!(out, "\n{}", saved)?;
        } else {
            writeln!(out, "{}", saved)?;
        }
        Ok(())
    }
}
