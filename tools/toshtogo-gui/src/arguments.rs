use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version = option_env!("TOSHTOGO_VERSION").unwrap_or_else(|| "dev"), about, long_about = None)]
pub struct CommandLineArguments {
  #[clap(short, long, default_value = "env.toml")]
  pub config: String,

  /// Overrides the api base url from the config file.
  #[clap(short, long)]
  pub api: Option<String>,

  /// A job id, or the location of a job view.
  pub target: String,
}
