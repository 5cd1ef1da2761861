use serde::{Deserialize, Serialize};
use std::{io, path::Path};

/// The identity this view presents to the backend when issuing commands. This describes the
/// calling agent, never the person clicking.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AgentDescriptor {
  pub system_name: String,
  pub system_version: String,
  pub hostname: String,
}

impl Default for AgentDescriptor {
  fn default() -> Self {
    Self {
      system_name: crate::constants::DEFAULT_AGENT_SYSTEM_NAME.to_string(),
      system_version: crate::constants::DEFAULT_AGENT_SYSTEM_VERSION.to_string(),
      hostname: crate::constants::DEFAULT_AGENT_HOSTNAME.to_string(),
    }
  }
}

/// Where the backend lives.
#[derive(Deserialize, Debug, Clone)]
pub struct ApiConfiguration {
  pub base_url: String,
}

/// How the view recovers the server-confirmed job after a successful command.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStrategy {
  /// Render the job returned in the command response.
  #[default]
  Response,

  /// Ignore the command response and run a fresh fetch.
  Refetch,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ViewConfiguration {
  #[serde(default)]
  pub refresh: RefreshStrategy,
}

/// The `toml` schema shared by the cli and gui binaries.
#[derive(Deserialize, Debug, Clone)]
pub struct Configuration {
  pub api: ApiConfiguration,
  pub agent: Option<AgentDescriptor>,
  pub view: Option<ViewConfiguration>,
}

impl Configuration {
  /// A configuration that only knows where the backend is.
  pub fn from_base_url<S>(base_url: S) -> Self
  where
    S: AsRef<str>,
  {
    Self {
      api: ApiConfiguration {
        base_url: base_url.as_ref().to_string(),
      },
      agent: None,
      view: None,
    }
  }

  /// Parses the api base, normalizing it so that relative joins keep its path.
  pub fn base_url(&self) -> io::Result<url::Url> {
    let mut base = url::Url::parse(&self.api.base_url).map_err(|error| {
      log::warn!("invalid api base url '{}' - {error}", self.api.base_url);
      io::Error::new(io::ErrorKind::InvalidInput, format!("invalid api base url - {error}"))
    })?;

    if base.cannot_be_a_base() {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("'{}' cannot be used as an api base", self.api.base_url),
      ));
    }

    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    Ok(base)
  }

  /// Builds the fetcher for this backend.
  pub fn fetcher(&self) -> io::Result<crate::fetcher::JobFetcher> {
    Ok(crate::fetcher::JobFetcher::new(self.base_url()?))
  }

  /// Builds the dispatcher for this backend, using the default agent identity unless one is
  /// configured.
  pub fn dispatcher(&self) -> io::Result<crate::dispatcher::ActionDispatcher> {
    let agent = self.agent.clone().unwrap_or_default();
    let refresh = self.view.as_ref().map(|view| view.refresh).unwrap_or_default();
    Ok(crate::dispatcher::ActionDispatcher::new(self.base_url()?, agent).with_refresh(refresh))
  }
}

/// Loads the configuration used by the binaries. An explicit base (the `--api` flag) always wins
/// over the one in the file. `TOSHTOGO_API_URL` is only consulted when there is no file at `path`.
pub fn load<P>(path: P, base_url: Option<&str>) -> io::Result<Configuration>
where
  P: AsRef<Path>,
{
  let path = path.as_ref();

  let mut config = match std::fs::read_to_string(path) {
    Ok(contents) => toml::from_str::<Configuration>(&contents).map_err(|error| {
      log::warn!("invalid toml config file '{}' - {error}", path.display());
      io::Error::new(io::ErrorKind::InvalidData, format!("bad-config - {error}"))
    })?,
    Err(error) if error.kind() == io::ErrorKind::NotFound => {
      let fallback = base_url
        .map(|base| base.to_string())
        .or_else(|| std::env::var(crate::constants::API_URL_ENV).ok())
        .ok_or_else(|| {
          io::Error::new(
            io::ErrorKind::NotFound,
            format!(
              "no config file at '{}' and no api url provided (set {})",
              path.display(),
              crate::constants::API_URL_ENV
            ),
          )
        })?;

      log::info!("no config file at '{}', using '{fallback}'", path.display());
      Configuration::from_base_url(fallback)
    }
    Err(error) => return Err(error),
  };

  if let Some(base_url) = base_url {
    config.api.base_url = base_url.to_string();
  }

  Ok(config)
}
