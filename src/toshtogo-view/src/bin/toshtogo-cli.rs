#![deny(unsafe_code)]

//! Shows a single toshtogo job in the terminal and issues the lifecycle commands its current outcome
//! allows.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io;

use toshtogo::terminal::TerminalSurface;

#[derive(Subcommand, Debug, PartialEq)]
enum CommandLineCommand {
  /// Fetch + render a job.
  Show {
    /// A job id, or the location of a job view.
    target: String,
  },
  /// Retry a job that is neither queued, running, finished nor waiting on dependencies.
  Retry {
    /// A job id, or the location of a job view.
    target: String,
  },
  /// Pause a job that is queued or running.
  Pause {
    /// A job id, or the location of a job view.
    target: String,
  },
}

impl CommandLineCommand {
  fn target(&self) -> &str {
    match self {
      Self::Show { target } | Self::Retry { target } | Self::Pause { target } => target.as_str(),
    }
  }

  fn control(&self) -> Option<toshtogo::Control> {
    match self {
      Self::Show { .. } => None,
      Self::Retry { .. } => Some(toshtogo::Control::RetryButton),
      Self::Pause { .. } => Some(toshtogo::Control::PauseButton),
    }
  }
}

#[derive(Parser)]
#[command(author, version = option_env!("TOSHTOGO_VERSION").unwrap_or_else(|| "dev"), about, long_about = None)]
struct CommandLineArguments {
  #[clap(short, long, default_value = "env.toml")]
  config: String,

  /// Overrides the api base url from the config file.
  #[clap(short, long)]
  api: Option<String>,

  /// Also print the whole job document.
  #[clap(short, long)]
  document: bool,

  #[command(subcommand)]
  command: CommandLineCommand,
}

async fn run(args: CommandLineArguments) -> anyhow::Result<()> {
  let config = toshtogo::config::load(&args.config, args.api.as_deref())
    .with_context(|| format!("unable to load configuration from '{}'", args.config))?;

  let fetcher = config.fetcher().with_context(|| "bad api configuration")?;
  let dispatcher = config.dispatcher().with_context(|| "bad api configuration")?;

  let job_id = toshtogo::job_id_from_target(args.command.target())
    .ok_or_else(|| anyhow::Error::msg(format!("no job id in '{}'", args.command.target())))?;

  let mut refresher = toshtogo::ViewRefresher::new(TerminalSurface::new(args.document));

  refresher
    .refresh(&fetcher, &job_id)
    .await
    .with_context(|| format!("unable to load job '{job_id}'"))?;

  let control = match args.command.control() {
    None => return print(&mut refresher),
    Some(control) => control,
  };

  let outcome = refresher
    .current()
    .map(|state| state.job().outcome().to_string())
    .unwrap_or_default();

  let settled = refresher
    .trigger(&fetcher, &dispatcher, control)
    .await
    .with_context(|| format!("unable to reload job '{job_id}'"))?;

  match settled {
    None => {
      print(&mut refresher)?;
      Err(anyhow::Error::msg(format!(
        "'{}' is not available for job '{job_id}' while it is '{outcome}'",
        control.label().to_lowercase()
      )))
    }
    Some(toshtogo::Settled::Rejected) => {
      print(&mut refresher)?;
      Err(anyhow::Error::msg("command rejected by the backend"))
    }
    Some(other) => {
      log::info!("command settled - {other:?}");
      print(&mut refresher)
    }
  }
}

fn print(refresher: &mut toshtogo::ViewRefresher<TerminalSurface>) -> anyhow::Result<()> {
  let stdout = io::stdout();
  refresher
    .surface_mut()
    .write_to(stdout.lock())
    .with_context(|| "unable to write view")
}

fn main() -> anyhow::Result<()> {
  let load_env = std::fs::metadata(".env").map(|meta| meta.is_file()).unwrap_or(false);

  if load_env {
    let env_result = dotenv::dotenv();
    println!(".env loaded? {:?}", env_result.is_ok());
  }

  env_logger::init();
  let args = CommandLineArguments::parse();
  async_std::task::block_on(run(args))
}
