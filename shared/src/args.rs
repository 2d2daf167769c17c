use clap::ArgGroup;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(name = "ia", author, version, about, long_about = None)]
pub struct Args {
    /// Path to the ia config file to read and write
    #[arg(long, global = true, env = "IA_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// The archive.org host to authenticate against
    #[arg(long, global = true, default_value = "archive.org")]
    pub host: String,

    /// Enables verbose logging to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Configure 'ia' with your archive.org credentials
    #[command(visible_alias = "co")]
    Configure(ConfigureArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
#[command(group(ArgGroup::new("action").args(["show", "check"])))]
pub struct ConfigureArgs {
    /// Provide username as an option rather than providing it interactively
    #[arg(short, long)]
    pub username: Option<String>,

    /// Provide password as an option rather than providing it interactively
    #[arg(short, long)]
    pub password: Option<String>,

    /// Use netrc file for login
    #[arg(short, long, default_value_t = false)]
    pub netrc: bool,

    /// Print the current configuration in JSON format, redacting secrets and cookies
    #[arg(short, long, default_value_t = false)]
    pub show: bool,

    /// Validate IA-S3 keys (exits 0 if valid, 1 otherwise)
    #[arg(short = 'C', long, default_value_t = false)]
    pub check: bool,

    /// Print archive.org logged-in-* cookies
    #[arg(short = 'c', long, default_value_t = false)]
    pub print_cookies: bool,
}
