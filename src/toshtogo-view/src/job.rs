//! The job record as reported by the backend. Instances are created from a fetched (or dispatch
//! response) document and never mutated afterwards; a new cycle always brings a new `Job`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The lifecycle state of a job. The backend owns this enumeration and may report values this
/// client has never heard of; those are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
  /// Queued but not yet claimed by an agent.
  Waiting,

  /// Claimed by an agent.
  Running,

  /// Completed successfully.
  Success,

  /// The job spawned dependencies and will be picked up again once they finish.
  MoreWork,

  /// Anything else the backend reports (`error`, `cancelled`, `paused`, `try-later`, ...).
  Other(String),
}

impl Outcome {
  /// The wire representation of this outcome.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Waiting => "waiting",
      Self::Running => "running",
      Self::Success => "success",
      Self::MoreWork => "more-work",
      Self::Other(other) => other.as_str(),
    }
  }

  /// Retrying only makes sense for jobs that are neither queued, in flight, finished nor waiting on
  /// dependencies.
  pub fn permits_retry(&self) -> bool {
    !matches!(self, Self::Waiting | Self::Success | Self::Running | Self::MoreWork)
  }

  /// Pausing is only offered while the job is queued or running.
  pub fn permits_pause(&self) -> bool {
    matches!(self, Self::Waiting | Self::Running)
  }
}

impl From<String> for Outcome {
  fn from(value: String) -> Self {
    match value.as_str() {
      "waiting" => Self::Waiting,
      "running" => Self::Running,
      "success" => Self::Success,
      "more-work" => Self::MoreWork,
      _ => Self::Other(value),
    }
  }
}

impl From<&str> for Outcome {
  fn from(value: &str) -> Self {
    Self::from(value.to_string())
  }
}

impl From<Outcome> for String {
  fn from(outcome: Outcome) -> Self {
    match outcome {
      Outcome::Other(other) => other,
      known => known.as_str().to_string(),
    }
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
    write!(formatter, "{}", self.as_str())
  }
}

/// What the backend reported as the product of the job. A result always takes precedence over an
/// error when a document carries both.
#[derive(Debug, Clone, PartialEq)]
pub enum JobResponse {
  /// Neither a result nor an error has been recorded.
  Pending,

  /// The `result_body` of the job.
  Result(Value),

  /// The `error` of the job.
  Error(Value),
}

impl JobResponse {
  /// Folds the two optional payloads of a job document into a single variant.
  fn from_parts(result_body: Option<Value>, error: Option<Value>) -> Self {
    match (result_body, error) {
      (Some(result), _) => Self::Result(result),
      (None, Some(error)) => Self::Error(error),
      (None, None) => Self::Pending,
    }
  }

  /// The payload that should be displayed in the response area, if any.
  pub fn payload(&self) -> Option<&Value> {
    match self {
      Self::Pending => None,
      Self::Result(payload) | Self::Error(payload) => Some(payload),
    }
  }
}

/// The subset of the job document this client understands. `null` payloads deserialize as absent.
#[derive(Deserialize)]
struct JobFields {
  job_id: String,
  job_type: String,
  outcome: Outcome,
  request_body: Value,
  #[serde(default)]
  result_body: Option<Value>,
  #[serde(default)]
  error: Option<Value>,
}

/// A single snapshot of a job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Job {
  job_id: String,
  job_type: String,
  outcome: Outcome,
  request_body: Value,
  response: JobResponse,

  /// The whole document as the backend sent it, including fields we do not model.
  document: Value,
}

impl Job {
  /// Attempts to build a job from a json document.
  pub fn from_value(document: Value) -> serde_json::Result<Self> {
    let JobFields {
      job_id,
      job_type,
      outcome,
      request_body,
      result_body,
      error,
    } = JobFields::deserialize(&document)?;

    Ok(Self {
      job_id,
      job_type,
      outcome,
      request_body,
      response: JobResponse::from_parts(result_body, error),
      document,
    })
  }

  pub fn id(&self) -> &str {
    &self.job_id
  }

  pub fn job_type(&self) -> &str {
    &self.job_type
  }

  pub fn outcome(&self) -> &Outcome {
    &self.outcome
  }

  pub fn request_body(&self) -> &Value {
    &self.request_body
  }

  pub fn response(&self) -> &JobResponse {
    &self.response
  }

  pub fn document(&self) -> &Value {
    &self.document
  }
}

impl TryFrom<Value> for Job {
  type Error = serde_json::Error;

  fn try_from(document: Value) -> serde_json::Result<Self> {
    Self::from_value(document)
  }
}

impl Serialize for Job {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    self.document.serialize(serializer)
  }
}

impl fmt::Display for Job {
  fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
    write!(formatter, "[{}] {} ({})", self.job_id, self.job_type, self.outcome)
  }
}
