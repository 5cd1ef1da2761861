//! The pure projection of a job into what should be on screen. Nothing in here touches a surface;
//! applying directives is the job of the refresher.

use serde_json::Value;
use std::fmt;

/// The lifecycle commands this view knows how to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
  Retry,
  Pause,
}

impl Action {
  /// The value of the `action` query parameter.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Retry => "retry",
      Self::Pause => "pause",
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
    write!(formatter, "{}", self.as_str())
  }
}

/// The clickable controls of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Control {
  RetryButton,
  PauseButton,
}

impl Control {
  /// Every control the view has; the reset step walks all of these.
  pub const ALL: [Control; 2] = [Control::RetryButton, Control::PauseButton];

  pub fn label(&self) -> &'static str {
    match self {
      Self::RetryButton => "Retry",
      Self::PauseButton => "Pause",
    }
  }
}

/// Whether a control is shown, and what it does when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
  Hidden,
  Visible(Action),
}

/// The visibility of every control for a single render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSet {
  pub retry: Visibility,
  pub pause: Visibility,
}

impl ControlSet {
  pub fn get(&self, control: Control) -> Visibility {
    match control {
      Control::RetryButton => self.retry,
      Control::PauseButton => self.pause,
    }
  }

  /// The controls that should be shown, paired with the action they are bound to.
  pub fn visible(&self) -> impl Iterator<Item = (Control, Action)> + '_ {
    Control::ALL.into_iter().filter_map(move |control| match self.get(control) {
      Visibility::Visible(action) => Some((control, action)),
      Visibility::Hidden => None,
    })
  }

  pub fn is_visible(&self, control: Control) -> bool {
    matches!(self.get(control), Visibility::Visible(_))
  }
}

/// Everything the view should display for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct Directives<'a> {
  /// Shown as the job type label.
  pub job_type: &'a str,

  /// The entire job document.
  pub document: &'a Value,

  /// The request payload tree.
  pub request: &'a Value,

  /// The response payload tree; `None` means the area is cleared.
  pub response: Option<&'a Value>,

  pub controls: ControlSet,
}

/// Maps a job to its directives. The two control rules are evaluated independently of each other.
pub fn render(job: &crate::job::Job) -> Directives<'_> {
  let outcome = job.outcome();

  let retry = if outcome.permits_retry() {
    Visibility::Visible(Action::Retry)
  } else {
    Visibility::Hidden
  };

  let pause = if outcome.permits_pause() {
    Visibility::Visible(Action::Pause)
  } else {
    Visibility::Hidden
  };

  Directives {
    job_type: job.job_type(),
    document: job.document(),
    request: job.request_body(),
    response: job.response().payload(),
    controls: ControlSet { retry, pause },
  }
}

#[cfg(test)]
mod tests {
  use super::{render, Action, Control, Visibility};
  use crate::job::Job;
  use serde_json::json;

  fn job(outcome: &str) -> Job {
    Job::from_value(json!({
      "job_id": "j-1",
      "job_type": "send-email",
      "outcome": outcome,
      "request_body": { "to": "someone" },
    }))
    .expect("valid job")
  }

  #[test]
  fn test_failed_shows_retry_only() {
    let failed = job("failed");
    let directives = render(&failed);
    assert_eq!(directives.controls.retry, Visibility::Visible(Action::Retry));
    assert_eq!(directives.controls.pause, Visibility::Hidden);
  }

  #[test]
  fn test_running_shows_pause_only() {
    let running = job("running");
    let directives = render(&running);
    assert_eq!(directives.controls.retry, Visibility::Hidden);
    assert_eq!(directives.controls.pause, Visibility::Visible(Action::Pause));
  }

  #[test]
  fn test_waiting_hides_retry() {
    let waiting = job("waiting");
    let directives = render(&waiting);
    assert_eq!(directives.controls.retry, Visibility::Hidden);
    assert_eq!(
      directives.controls.visible().collect::<Vec<_>>(),
      vec![(Control::PauseButton, Action::Pause)]
    );
  }

  #[test]
  fn test_terminal_known_outcomes_show_nothing() {
    for outcome in ["success", "more-work"] {
      let terminal = job(outcome);
      assert_eq!(render(&terminal).controls.visible().count(), 0, "{outcome}");
    }
  }

  #[test]
  fn test_never_both_controls() {
    for outcome in ["waiting", "running", "success", "more-work", "error", "cancelled", "paused"] {
      let subject = job(outcome);
      let controls = render(&subject).controls;
      assert!(
        !(controls.is_visible(Control::RetryButton) && controls.is_visible(Control::PauseButton)),
        "{outcome}"
      );
    }
  }

  #[test]
  fn test_payload_areas() {
    let both = Job::from_value(json!({
      "job_id": "j-1",
      "job_type": "send-email",
      "outcome": "success",
      "request_body": { "to": "someone" },
      "result_body": { "sent": true },
      "error": { "message": "stale" },
    }))
    .expect("valid job");

    let directives = render(&both);
    assert_eq!(directives.job_type, "send-email");
    assert_eq!(directives.request, &json!({ "to": "someone" }));
    assert_eq!(directives.response, Some(&json!({ "sent": true })));

    let pending = job("waiting");
    assert_eq!(render(&pending).response, None);
  }

  #[test]
  fn test_render_is_stable() {
    let subject = job("error");
    assert_eq!(render(&subject), render(&subject));
  }
}
