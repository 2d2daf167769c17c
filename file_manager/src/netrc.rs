use directories::UserDirs;
use std::collections::HashMap;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum NetrcError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
    #[error("{message} (line {line})")]
    Parse { line: usize, message: String },
    #[error("{0}")]
    Permissions(String),
    #[error("unable to locate the home directory")]
    NoHome,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Credentials for one `machine` (or the `default`) entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Authenticator {
    pub login: Option<String>,
    pub account: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Netrc {
    pub hosts: HashMap<String, Authenticator>,
    pub default: Option<Authenticator>,
}

impl Netrc {
    /// `$NETRC` if set, otherwise `~/.netrc`.
    pub fn file_path() -> Result<PathBuf, NetrcError> {
        if let Some(path) = std::env::var_os("NETRC").filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let user_dirs = UserDirs::new().ok_or(NetrcError::NoHome)?;
        Ok(user_dirs.home_dir().join(".netrc"))
    }

    pub fn read_file(path: &Path) -> Result<Netrc, NetrcError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NetrcError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };

        let netrc = Self::parse(&contents)?;
        debug!(
            "Parsed {} machine entries from {}",
            netrc.hosts.len(),
            path.display()
        );

        Ok(netrc)
    }

    /// Reads the user's own netrc. On unix, a file holding a password for any login other
    /// than `anonymous` must belong to the current user and be closed to group and others.
    pub fn read_private_file(path: &Path) -> Result<Netrc, NetrcError> {
        let netrc = Self::read_file(path)?;
        if netrc.has_secrets() {
            check_private(path)?;
        }
        Ok(netrc)
    }

    fn has_secrets(&self) -> bool {
        self.hosts
            .values()
            .chain(self.default.iter())
            .any(|a| a.password.is_some() && a.login.as_deref() != Some("anonymous"))
    }

    pub fn parse(contents: &str) -> Result<Netrc, NetrcError> {
        let mut lexer = Lexer::new(contents);
        let mut netrc = Netrc::default();
        let mut lookahead = lexer.next_token()?;

        while let Some(token) = lookahead.take() {
            match token.as_str() {
                "machine" => {
                    let name = lexer.expect_value("machine")?;
                    let (entry, next) = parse_entry(&mut lexer)?;
                    netrc.hosts.insert(name, entry);
                    lookahead = next;
                }
                "default" => {
                    let (entry, next) = parse_entry(&mut lexer)?;
                    netrc.default = Some(entry);
                    lookahead = next;
                }
                "macdef" => {
                    let _ = lexer.expect_value("macdef")?;
                    lexer.skip_macro_body();
                    lookahead = lexer.next_token()?;
                }
                other => {
                    return Err(NetrcError::Parse {
                        line: lexer.line,
                        message: format!("bad toplevel token '{}'", other),
                    })
                }
            }
        }

        Ok(netrc)
    }

    /// Exact lookup by machine name; the `default` entry is not consulted.
    pub fn host(&self, name: &str) -> Option<&Authenticator> {
        self.hosts.get(name)
    }
}

#[cfg(unix)]
fn check_private(path: &Path) -> Result<(), NetrcError> {
    use std::os::unix::fs::MetadataExt;

    let metadata = std::fs::metadata(path)?;
    // SAFETY: getuid has no preconditions and cannot fail
    let uid = unsafe { libc::getuid() };

    if metadata.uid() != uid {
        return Err(NetrcError::Permissions(format!(
            "~/.netrc file owner ({}) does not match current user ({})",
            metadata.uid(),
            uid
        )));
    }
    if metadata.mode() & 0o077 != 0 {
        return Err(NetrcError::Permissions(
            "~/.netrc access too permissive: access permissions must restrict access to only the owner"
                .to_owned(),
        ));
    }

    Ok(())
}

#[cfg(not(unix))]
fn check_private(_path: &Path) -> Result<(), NetrcError> {
    Ok(())
}

/// Reads `login`/`account`/`password` pairs until the next entry keyword, which is
/// handed back to the caller.
fn parse_entry(lexer: &mut Lexer) -> Result<(Authenticator, Option<String>), NetrcError> {
    let mut entry = Authenticator::default();

    loop {
        let Some(token) = lexer.next_token()? else {
            return Ok((entry, None));
        };

        match token.as_str() {
            "machine" | "default" | "macdef" => return Ok((entry, Some(token))),
            "login" | "user" => entry.login = Some(lexer.expect_value("login")?),
            "account" => entry.account = Some(lexer.expect_value("account")?),
            "password" | "passwd" => entry.password = Some(lexer.expect_value("password")?),
            other => {
                return Err(NetrcError::Parse {
                    line: lexer.line,
                    message: format!("bad follower token '{}'", other),
                })
            }
        }
    }
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(contents: &'a str) -> Self {
        Self {
            chars: contents.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn next_token(&mut self) -> Result<Option<String>, NetrcError> {
        loop {
            while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
                self.bump();
            }

            match self.chars.peek() {
                None => return Ok(None),
                Some('#') => self.skip_line(),
                Some('"') => return self.quoted().map(Some),
                Some(_) => return Ok(Some(self.bare())),
            }
        }
    }

    fn expect_value(&mut self, keyword: &str) -> Result<String, NetrcError> {
        let line = self.line;
        self.next_token()?.ok_or_else(|| NetrcError::Parse {
            line,
            message: format!("missing value after '{}'", keyword),
        })
    }

    fn bare(&mut self) -> String {
        let mut token = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                break;
            }
            self.bump();
            if c == '\\' {
                if let Some(escaped) = self.bump() {
                    token.push(escaped);
                }
            } else {
                token.push(c);
            }
        }
        token
    }

    fn quoted(&mut self) -> Result<String, NetrcError> {
        let start = self.line;
        self.bump();

        let mut token = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(token),
                Some('\\') => match self.bump() {
                    Some(escaped) => token.push(escaped),
                    None => break,
                },
                Some(c) => token.push(c),
                None => break,
            }
        }

        Err(NetrcError::Parse {
            line: start,
            message: "unterminated quoted token".to_owned(),
        })
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    /// A macro body runs from the line after `macdef <name>` up to the first empty line.
    fn skip_macro_body(&mut self) {
        self.skip_line();
        loop {
            let mut blank = true;
            let mut consumed = false;
            while let Some(c) = self.bump() {
                consumed = true;
                if c == '\n' {
                    break;
                }
                if !c.is_whitespace() {
                    blank = false;
                }
            }
            if !consumed || blank {
                return;
            }
        }
    }
}
