use serde_json::Value;

use toshtogo::{Control, DispatchFailure, Job, Surface, Ticket, ViewRefresher};

/// Payload trees are shown as indented json text.
fn tree(value: &Value) -> String {
  serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Everything the window draws. The application only ever changes this through the `Surface`
/// implementation (driven by the refresher) or through the page-level error + notice helpers.
#[derive(Debug, Default)]
pub struct Panel {
  retry: bool,
  pause: bool,
  job_type: String,
  document: String,
  request: String,
  response: Option<String>,
  notice: Option<String>,
  page_error: Option<String>,
}

impl Panel {
  pub fn is_visible(&self, control: Control) -> bool {
    match control {
      Control::RetryButton => self.retry,
      Control::PauseButton => self.pause,
    }
  }

  pub fn job_type(&self) -> &str {
    self.job_type.as_str()
  }

  pub fn document_tree(&self) -> &str {
    self.document.as_str()
  }

  pub fn request_tree(&self) -> &str {
    self.request.as_str()
  }

  pub fn response_tree(&self) -> Option<&str> {
    self.response.as_deref()
  }

  pub fn notice(&self) -> Option<&str> {
    self.notice.as_deref()
  }

  pub fn dismiss(&mut self) {
    self.notice = None;
  }

  pub fn page_error(&self) -> Option<&str> {
    self.page_error.as_deref()
  }

  /// A failed fetch is not something the view can recover from; it is shown until the next load.
  pub fn set_page_error(&mut self, error: Option<String>) {
    self.page_error = error;
  }
}

/// Folds the result of a load into the window. A load issued before the cycle on screen changes
/// nothing, not even the page error; the displayed cycle is returned in that case.
pub fn loaded(
  refresher: &mut ViewRefresher<Panel>,
  ticket: Ticket,
  result: Result<Job, String>,
) -> Option<Ticket> {
  if let Some(displayed) = refresher.superseded_by(ticket) {
    return Some(displayed);
  }

  match result {
    Ok(job) => {
      refresher.apply(ticket, job);
      refresher.surface_mut().set_page_error(None);
    }
    Err(error) => refresher.surface_mut().set_page_error(Some(error)),
  }

  None
}

impl Surface for Panel {
  fn hide(&mut self, control: Control) {
    match control {
      Control::RetryButton => self.retry = false,
      Control::PauseButton => self.pause = false,
    }
  }

  fn show(&mut self, control: Control) {
    match control {
      Control::RetryButton => self.retry = true,
      Control::PauseButton => self.pause = true,
    }
  }

  fn label(&mut self, job_type: &str) {
    self.job_type = job_type.to_string();
  }

  fn document(&mut self, document: &Value) {
    self.document = tree(document);
  }

  fn request(&mut self, payload: &Value) {
    self.request = tree(payload);
  }

  fn response(&mut self, payload: Option<&Value>) {
    self.response = payload.map(tree);
  }

  fn notify(&mut self, failure: &DispatchFailure) {
    self.notice = Some(failure.to_string());
  }
}

#[cfg(test)]
mod tests {
  use super::{loaded, Panel};
  use serde_json::json;
  use toshtogo::{Control, DispatchFailure, Job, ViewRefresher};

  fn job(outcome: &str) -> Job {
    Job::from_value(json!({
      "job_id": "j-9",
      "job_type": "thumbnail",
      "outcome": outcome,
      "request_body": { "size": 64 },
      "result_body": { "path": "/tmp/t.png" },
    }))
    .expect("valid job")
  }

  #[test]
  fn test_panel_follows_cycles() {
    let mut refresher = ViewRefresher::new(Panel::default());
    let first = refresher.ticket();
    refresher.apply(first, job("running"));

    let panel = refresher.surface();
    assert!(panel.is_visible(Control::PauseButton));
    assert!(!panel.is_visible(Control::RetryButton));
    assert_eq!(panel.job_type(), "thumbnail");
    assert_eq!(panel.request_tree(), "{\n  \"size\": 64\n}");
    assert_eq!(panel.response_tree(), Some("{\n  \"path\": \"/tmp/t.png\"\n}"));

    let second = refresher.ticket();
    refresher.apply(second, job("success"));
    let panel = refresher.surface();
    assert!(!panel.is_visible(Control::PauseButton));
    assert!(!panel.is_visible(Control::RetryButton));
  }

  #[test]
  fn test_notice_is_dismissable() {
    let mut refresher = ViewRefresher::new(Panel::default());
    let ticket = refresher.ticket();
    let failure = DispatchFailure {
      status: Some("503 Service Unavailable".to_string()),
      body: "down for maintenance".to_string(),
    };

    refresher.settle(ticket, Err(failure));
    assert!(refresher
      .surface()
      .notice()
      .map(|notice| notice.ends_with("down for maintenance"))
      .unwrap_or(false));

    refresher.surface_mut().dismiss();
    assert_eq!(refresher.surface().notice(), None);
  }

  #[test]
  fn test_stale_loads_leave_page_error_alone() {
    let mut refresher = ViewRefresher::new(Panel::default());
    let early = refresher.ticket();
    let late = refresher.ticket();

    assert_eq!(loaded(&mut refresher, late, Ok(job("running"))), None);
    assert_eq!(
      loaded(&mut refresher, early, Err("connection refused".to_string())),
      Some(late)
    );
    assert_eq!(refresher.surface().page_error(), None);
    assert!(refresher.surface().is_visible(Control::PauseButton));

    let failing = refresher.ticket();
    assert_eq!(loaded(&mut refresher, failing, Err("timed out".to_string())), None);
    assert_eq!(refresher.surface().page_error(), Some("timed out"));

    assert_eq!(loaded(&mut refresher, early, Ok(job("success"))), Some(late));
    assert_eq!(refresher.surface().page_error(), Some("timed out"));
    assert!(refresher.surface().is_visible(Control::PauseButton));

    let reload = refresher.ticket();
    assert_eq!(loaded(&mut refresher, reload, Ok(job("success"))), None);
    assert_eq!(refresher.surface().page_error(), None);
    assert!(!refresher.surface().is_visible(Control::PauseButton));
  }
}
