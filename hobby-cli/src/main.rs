use std::fmt::{self, Display, Formatter};

use clap::{Parser, Subcommand};
use colored::Colorize;
use hobby_lib::{Repository, repository::entities};
use sysexits::ExitCode;
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod miniature;
mod photo;
mod render;
mod stats;

#[derive(Parser, Debug)]
#[command(name = "hobby")]
#[command(author, version, about = "Track the miniatures on your painting table")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    #[command(flatten)]
    Miniature(miniature::Command),
    /// Operate on a miniature's photos
    #[command(subcommand)]
    Photo(photo::Command),
    /// Show collection statistics
    Stats,
    /// Show or change settings
    Config(config::Command),
}

/// Why a command could not be carried out
#[derive(Debug)]
pub enum Failure {
    Lib(hobby_lib::Error),
    Usage(String),
    /// Nothing matched what was asked for
    Missing(String),
}

impl Failure {
    fn exit_code(&self) -> ExitCode {
        use entities::Error::*;

        match self {
            Failure::Usage(_) => ExitCode::Usage,
            Failure::Missing(_) => ExitCode::NoInput,
            Failure::Lib(hobby_lib::Error::Repository(err)) => match err {
                EmptyName | AlreadyStored(_) => ExitCode::DataErr,
                NotFound(_) => ExitCode::NoInput,
                Io(_) => ExitCode::IoErr,
                Internal(_) | Corrupt(_) | UnsupportedModelVersion(_) => ExitCode::Software,
            },
            Failure::Lib(hobby_lib::Error::Config(_)) => ExitCode::Config,
            Failure::Lib(hobby_lib::Error::Dirs(_)) => ExitCode::CantCreat,
        }
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Lib(err) => write!(f, "{err}"),
            Failure::Usage(msg) | Failure::Missing(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<hobby_lib::Error> for Failure {
    fn from(err: hobby_lib::Error) -> Self {
        Failure::Lib(err)
    }
}

impl From<entities::Error> for Failure {
    fn from(err: entities::Error) -> Self {
        Failure::Lib(err.into())
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Failure::Lib(entities::Error::Io(err).into())
    }
}

fn main() -> ExitCode {
    // Human friendly panicking in release mode
    human_panic::setup_panic!();

    // Logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set up logging: {err}");
    }

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::Ok,
        Err(failure) => {
            eprintln!("{} {failure}", "error:".red().bold());
            failure.exit_code()
        }
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    let mut repo = Repository::new()?;
    debug!("Running {:?}", cli.command);

    match &cli.command {
        Command::Miniature(cmd) => miniature::handle(&repo, cmd),
        Command::Photo(cmd) => photo::handle(&repo, cmd),
        Command::Stats => stats::handle(&repo),
        Command::Config(cmd) => config::handle(&mut repo, cmd),
    }
}

#[cfg(test)]
mod test {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_not_found_exit_codes_agree() {
        let missing = Failure::Missing("No miniature matches 'abc'".into());
        let not_found = Failure::from(entities::Error::NotFound(Uuid::new_v4()));

        assert_eq!(missing.exit_code(), ExitCode::NoInput);
        assert_eq!(missing.exit_code(), not_found.exit_code());
        assert_eq!(Failure::Usage(String::new()).exit_code(), ExitCode::Usage);
    }
}
