use serde::Serialize;
use std::{fmt, io};

use crate::config::{AgentDescriptor, RefreshStrategy};
use crate::job::Job;
use crate::renderer::Action;

/// The json body sent with every command.
#[derive(Debug, Serialize)]
struct CommandPayload<'a> {
  agent: &'a AgentDescriptor,
}

/// What a successful command gave back to us.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
  /// The backend echoed the job after applying the command.
  Updated(Job),

  /// The command was accepted but the job has to be fetched again to see its effect.
  Accepted,
}

/// A command the backend (or the transport) refused. Both parts are kept verbatim for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchFailure {
  /// The status line; absent when no response was received at all.
  pub status: Option<String>,

  pub body: String,
}

impl DispatchFailure {
  fn transport<E>(error: E) -> Self
  where
    E: fmt::Display,
  {
    Self {
      status: None,
      body: error.to_string(),
    }
  }
}

impl fmt::Display for DispatchFailure {
  fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
    writeln!(formatter, "Error")?;
    writeln!(formatter, "------------------------")?;
    writeln!(formatter, "status:{}", self.status.as_deref().unwrap_or("no response"))?;
    writeln!(formatter, "body:")?;
    write!(formatter, "{}", self.body)
  }
}

impl std::error::Error for DispatchFailure {}

/// Sends lifecycle commands for jobs.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
  base: url::Url,
  agent: AgentDescriptor,
  refresh: RefreshStrategy,
}

impl ActionDispatcher {
  pub fn new(base: url::Url, agent: AgentDescriptor) -> Self {
    Self {
      base,
      agent,
      refresh: RefreshStrategy::default(),
    }
  }

  pub fn with_refresh(mut self, refresh: RefreshStrategy) -> Self {
    self.refresh = refresh;
    self
  }

  /// The command url for a job + action pair.
  pub fn command_url(&self, job_id: &str, action: Action) -> io::Result<url::Url> {
    let mut uri = crate::fetcher::job_resource(&self.base, job_id)?;
    uri
      .query_pairs_mut()
      .append_pair(crate::constants::ACTION_QUERY_PARAM, action.as_str());
    Ok(uri)
  }

  /// Issues a command for the job. Nothing local is touched here; the caller decides what to do
  /// with the result (a full refresh on success, a notice on failure).
  pub async fn dispatch(&self, job: &Job, action: Action) -> Result<DispatchOutcome, DispatchFailure> {
    let uri = self.command_url(job.id(), action).map_err(DispatchFailure::transport)?;
    log::info!("dispatching '{action}' for job '{}' ({})", job.id(), job.outcome());

    let mut res = surf::post(&uri)
      .body_json(&CommandPayload { agent: &self.agent })
      .map_err(|error| {
        log::warn!("unable to serialize command payload - {error}");
        DispatchFailure::transport(error)
      })?
      .await
      .map_err(|error| {
        log::warn!("command transport failure for job '{}' - {error}", job.id());
        DispatchFailure::transport(error)
      })?;

    let status = res.status();
    let body = res.body_string().await.map_err(DispatchFailure::transport)?;

    if !status.is_success() {
      log::warn!("backend refused '{action}' for job '{}' - '{status}'", job.id());
      return Err(DispatchFailure {
        status: Some(format!("{} {}", status, status.canonical_reason())),
        body,
      });
    }

    if self.refresh == RefreshStrategy::Refetch {
      return Ok(DispatchOutcome::Accepted);
    }

    match serde_json::from_str::<Job>(&body) {
      Ok(updated) => {
        log::debug!("command response carries job '{}' ({})", updated.id(), updated.outcome());
        Ok(DispatchOutcome::Updated(updated))
      }
      Err(error) => {
        log::debug!("command response is not a job ({error}), a fetch will be required");
        Ok(DispatchOutcome::Accepted)
      }
    }
  }
}
