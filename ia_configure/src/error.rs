use file_manager::netrc::NetrcError;

/// Which of the logged-in cookies are absent from the config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingCookie {
    Both,
    User,
    Sig,
}

impl MissingCookie {
    /// Both cookie values, or which of them is absent.
    pub fn require<'a>(
        user: Option<&'a str>,
        sig: Option<&'a str>,
    ) -> Result<(&'a str, &'a str), Self> {
        match (user, sig) {
            (Some(user), Some(sig)) => Ok((user, sig)),
            (None, None) => Err(MissingCookie::Both),
            (None, Some(_)) => Err(MissingCookie::User),
            (Some(_), None) => Err(MissingCookie::Sig),
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            MissingCookie::Both => {
                "'logged-in-user' and 'logged-in-sig' cookies not found in config file, try reconfiguring."
            }
            MissingCookie::User => {
                "'logged-in-user' cookie not found in config file, try reconfiguring."
            }
            MissingCookie::Sig => "'logged-in-sig' cookie not found in config file, try reconfiguring.",
        }
    }
}

/// Every way `ia configure` can fail. The `Display` output is exactly what the user sees.
#[derive(Debug, thiserror::Error)]
pub enum ConfigureError {
    #[error("error: {}", .0.message())]
    MissingCookie(MissingCookie),
    #[error("Your credentials are invalid, check your configuration and try again")]
    InvalidCredentials,
    #[error("error: .netrc file not found.")]
    NetrcNotFound,
    #[error("error: cannot parse your .netrc file: {0}")]
    NetrcParse(String),
    #[error("error: cannot read your .netrc file: {0}")]
    NetrcUnreadable(#[source] NetrcError),
    #[error("error: no entry for '{0}' found in your .netrc file.")]
    NetrcHostNotFound(String),
    #[error("\nerror: {0}")]
    Authentication(String),
    #[error("error: {0:#}")]
    Configure(anyhow::Error),
    #[error("error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigureError {
    /// Invalid credentials are a normal `--check` answer and go to stdout.
    pub fn is_stdout(&self) -> bool {
        matches!(self, ConfigureError::InvalidCredentials)
    }
}

impl From<NetrcError> for ConfigureError {
    fn from(e: NetrcError) -> Self {
        match e {
            NetrcError::NotFound(_) => ConfigureError::NetrcNotFound,
            NetrcError::Parse { .. } | NetrcError::Permissions(_) => {
                ConfigureError::NetrcParse(e.to_string())
            }
            other => ConfigureError::NetrcUnreadable(other),
        }
    }
}

impl From<anyhow::Error> for ConfigureError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<archive::auth::AuthenticationError>() {
            Ok(auth) => ConfigureError::Authentication(auth.0),
            Err(e) => ConfigureError::Configure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive::auth::AuthenticationError;

    #[test]
    fn detects_which_cookie_is_missing() {
        assert_eq!(MissingCookie::require(None, None), Err(MissingCookie::Both));
        assert_eq!(MissingCookie::require(None, Some("s")), Err(MissingCookie::User));
        assert_eq!(MissingCookie::require(Some("u"), None), Err(MissingCookie::Sig));
        assert_eq!(MissingCookie::require(Some("u"), Some("s")), Ok(("u", "s")));
    }

    #[test]
    fn missing_cookie_messages() {
        assert_eq!(
            ConfigureError::MissingCookie(MissingCookie::Both).to_string(),
            "error: 'logged-in-user' and 'logged-in-sig' cookies not found in config file, try reconfiguring."
        );
        assert_eq!(
            ConfigureError::MissingCookie(MissingCookie::User).to_string(),
            "error: 'logged-in-user' cookie not found in config file, try reconfiguring."
        );
        assert_eq!(
            ConfigureError::MissingCookie(MissingCookie::Sig).to_string(),
            "error: 'logged-in-sig' cookie not found in config file, try reconfiguring."
        );
    }

    #[test]
    fn authentication_error_is_recovered_from_anyhow() {
        let err: ConfigureError =
            anyhow::Error::from(AuthenticationError("Incorrect password, try again.".into())).into();
        assert!(matches!(err, ConfigureError::Authentication(_)));
        assert_eq!(err.to_string(), "\nerror: Incorrect password, try again.");
    }

    #[test]
    fn other_collaborator_errors_keep_context() {
        let err: ConfigureError = anyhow::anyhow!("connection refused")
            .context("unable to reach archive.org")
            .into();
        assert_eq!(
            err.to_string(),
            "error: unable to reach archive.org: connection refused"
        );
    }

    #[test]
    fn netrc_errors_map_to_distinct_variants() {
        let not_found: ConfigureError = NetrcError::NotFound("/home/a/.netrc".into()).into();
        assert_eq!(not_found.to_string(), "error: .netrc file not found.");

        let parse: ConfigureError = NetrcError::Parse {
            line: 2,
            message: "bad toplevel token 'x'".into(),
        }
        .into();
        assert_eq!(
            parse.to_string(),
            "error: cannot parse your .netrc file: bad toplevel token 'x' (line 2)"
        );

        let permissive: ConfigureError =
            NetrcError::Permissions("~/.netrc access too permissive".into()).into();
        assert_eq!(
            permissive.to_string(),
            "error: cannot parse your .netrc file: ~/.netrc access too permissive"
        );
    }

    #[test]
    fn only_invalid_credentials_go_to_stdout() {
        assert!(ConfigureError::InvalidCredentials.is_stdout());
        assert!(!ConfigureError::NetrcNotFound.is_stdout());
    }
}
