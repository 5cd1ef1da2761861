//! The refresher owns the single displayed job and the handlers bound to its controls. Every display
//! cycle builds a brand new `ViewState`; nothing from a previous cycle survives into the next one.

use serde_json::Value;
use std::{collections::BTreeMap, io, sync::Arc};

use crate::dispatcher::{ActionDispatcher, DispatchFailure, DispatchOutcome};
use crate::fetcher::JobFetcher;
use crate::job::Job;
use crate::renderer::{Action, Control};

/// Whatever is actually drawing the view. Implementations only mirror what they are told; all of
/// the policy lives in the renderer + refresher.
pub trait Surface {
  /// Hides a control. Hiding an already hidden control is a no-op.
  fn hide(&mut self, control: Control);

  fn show(&mut self, control: Control);

  fn label(&mut self, job_type: &str);

  fn document(&mut self, document: &Value);

  fn request(&mut self, payload: &Value);

  /// Replaces the response area; `None` clears it.
  fn response(&mut self, payload: Option<&Value>);

  /// Reports a refused command to the user.
  fn notify(&mut self, failure: &DispatchFailure);
}

/// Issued at the start of every fetch or dispatch. Results are only applied when their ticket is
/// newer than whatever cycle is currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
  pub fn sequence(&self) -> u64 {
    self.0
  }
}

/// A click handler: "dispatch this action for this snapshot".
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
  pub control: Control,
  pub action: Action,

  /// The cycle that bound this handler.
  pub cycle: Ticket,

  pub job: Arc<Job>,
}

/// The state of one display cycle.
#[derive(Debug, Clone)]
pub struct ViewState {
  cycle: Ticket,
  job: Arc<Job>,
  bindings: BTreeMap<Control, Binding>,
}

impl ViewState {
  pub fn cycle(&self) -> Ticket {
    self.cycle
  }

  pub fn job(&self) -> &Job {
    &self.job
  }

  pub fn binding(&self, control: Control) -> Option<&Binding> {
    self.bindings.get(&control)
  }

  pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
    self.bindings.values()
  }
}

/// The result of trying to apply a job to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
  /// A new cycle is on screen.
  Rendered(Ticket),

  /// A newer cycle was already displayed; the job was dropped.
  Stale { ticket: Ticket, displayed: Ticket },
}

/// The result of settling a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
  /// The job returned by the backend went through a full cycle (or was stale).
  Refreshed(Applied),

  /// The backend accepted the command without returning the job; fetch it again and apply the
  /// result with this ticket.
  Refetch(Ticket),

  /// The command failed. The failure was reported and the view is untouched.
  Rejected,
}

/// Orchestrates fetch, reset, render and bind for a surface.
pub struct ViewRefresher<S> {
  surface: S,
  issued: u64,
  current: Option<ViewState>,
}

impl<S> ViewRefresher<S>
where
  S: Surface,
{
  pub fn new(surface: S) -> Self {
    Self {
      surface,
      issued: 0,
      current: None,
    }
  }

  pub fn surface(&self) -> &S {
    &self.surface
  }

  pub fn surface_mut(&mut self) -> &mut S {
    &mut self.surface
  }

  pub fn current(&self) -> Option<&ViewState> {
    self.current.as_ref()
  }

  /// Issues the next ticket.
  pub fn ticket(&mut self) -> Ticket {
    self.issued += 1;
    Ticket(self.issued)
  }

  /// The displayed cycle, when it is at least as new as `ticket`. Anything obtained under such a
  /// ticket is out of date.
  pub fn superseded_by(&self, ticket: Ticket) -> Option<Ticket> {
    self
      .current
      .as_ref()
      .map(|state| state.cycle)
      .filter(|displayed| ticket <= *displayed)
  }

  /// Runs the reset, render, bind steps for a job that was obtained under `ticket`.
  pub fn apply(&mut self, ticket: Ticket, job: Job) -> Applied {
    if let Some(displayed) = self.superseded_by(ticket) {
      log::warn!(
        "dropping job '{}' from cycle {} - cycle {} is already displayed",
        job.id(),
        ticket.0,
        displayed.0
      );
      return Applied::Stale { ticket, displayed };
    }

    // Reset: everything hidden and nothing bound, regardless of what the last cycle showed.
    for control in Control::ALL {
      self.surface.hide(control);
    }
    self.current = None;

    let job = Arc::new(job);
    let directives = crate::renderer::render(&job);
    let mut bindings = BTreeMap::new();

    self.surface.document(directives.document);

    for (control, action) in directives.controls.visible() {
      self.surface.show(control);
      bindings.insert(
        control,
        Binding {
          control,
          action,
          cycle: ticket,
          job: job.clone(),
        },
      );
    }

    self.surface.label(directives.job_type);
    self.surface.request(directives.request);
    self.surface.response(directives.response);

    log::debug!(
      "cycle {} rendered job '{}' ({}) with {} bound control(s)",
      ticket.0,
      job.id(),
      job.outcome(),
      bindings.len()
    );

    self.current = Some(ViewState {
      cycle: ticket,
      job,
      bindings,
    });

    Applied::Rendered(ticket)
  }

  /// The handler bound to a control in the displayed cycle, if any.
  pub fn click(&self, control: Control) -> Option<Binding> {
    let binding = self.current.as_ref().and_then(|state| state.binding(control)).cloned();

    if binding.is_none() {
      log::debug!("click on unbound control {control:?} ignored");
    }

    binding
  }

  /// Folds the result of a dispatch (issued under `ticket`) back into the view.
  pub fn settle(&mut self, ticket: Ticket, result: Result<DispatchOutcome, DispatchFailure>) -> Settled {
    match result {
      Ok(DispatchOutcome::Updated(job)) => Settled::Refreshed(self.apply(ticket, job)),
      Ok(DispatchOutcome::Accepted) => Settled::Refetch(ticket),
      Err(failure) => {
        log::warn!("command from cycle {} failed - {:?}", ticket.0, failure.status);
        self.surface.notify(&failure);
        Settled::Rejected
      }
    }
  }

  /// One complete display cycle: the fetch is awaited before anything is reset or rendered.
  pub async fn refresh(&mut self, fetcher: &JobFetcher, job_id: &str) -> io::Result<Applied> {
    let ticket = self.ticket();
    let job = fetcher.fetch(job_id).await?;
    Ok(self.apply(ticket, job))
  }

  /// Clicks a control, dispatches whatever it is bound to and settles the result, fetching again
  /// when the backend did not return the job. Returns `None` when the control is not bound.
  pub async fn trigger(
    &mut self,
    fetcher: &JobFetcher,
    dispatcher: &ActionDispatcher,
    control: Control,
  ) -> io::Result<Option<Settled>> {
    let binding = match self.click(control) {
      Some(binding) => binding,
      None => return Ok(None),
    };

    let ticket = self.ticket();
    let result = dispatcher.dispatch(&binding.job, binding.action).await;

    match self.settle(ticket, result) {
      Settled::Refetch(ticket) => {
        let job = fetcher.fetch(binding.job.id()).await?;
        Ok(Some(Settled::Refreshed(self.apply(ticket, job))))
      }
      other => Ok(Some(other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{Applied, Settled, Surface, ViewRefresher};
  use crate::dispatcher::{DispatchFailure, DispatchOutcome};
  use crate::job::Job;
  use crate::renderer::{Action, Control};
  use serde_json::{json, Value};
  use std::collections::BTreeSet;

  #[derive(Default, Debug)]
  struct RecordingSurface {
    visible: BTreeSet<Control>,
    label: Option<String>,
    request: Option<Value>,
    response: Option<Value>,
    notices: Vec<String>,
    hides: usize,
  }

  impl Surface for RecordingSurface {
    fn hide(&mut self, control: Control) {
      self.hides += 1;
      self.visible.remove(&control);
    }

    fn show(&mut self, control: Control) {
      self.visible.insert(control);
    }

    fn label(&mut self, job_type: &str) {
      self.label = Some(job_type.to_string());
    }

    fn document(&mut self, _document: &Value) {}

    fn request(&mut self, payload: &Value) {
      self.request = Some(payload.clone());
    }

    fn response(&mut self, payload: Option<&Value>) {
      self.response = payload.cloned();
    }

    fn notify(&mut self, failure: &DispatchFailure) {
      self.notices.push(failure.to_string());
    }
  }

  fn job(outcome: &str) -> Job {
    Job::from_value(json!({
      "job_id": "j-1",
      "job_type": "import",
      "outcome": outcome,
      "request_body": { "file": "a.csv" },
      "error": { "message": "boom" },
    }))
    .expect("valid job")
  }

  fn visible(refresher: &ViewRefresher<RecordingSurface>) -> Vec<Control> {
    refresher.surface().visible.iter().copied().collect()
  }

  #[test]
  fn test_apply_renders_and_binds() {
    let mut refresher = ViewRefresher::new(RecordingSurface::default());
    let ticket = refresher.ticket();
    assert_eq!(refresher.apply(ticket, job("error")), Applied::Rendered(ticket));

    assert_eq!(visible(&refresher), vec![Control::RetryButton]);
    assert_eq!(refresher.surface().label.as_deref(), Some("import"));
    assert_eq!(refresher.surface().request, Some(json!({ "file": "a.csv" })));
    assert_eq!(refresher.surface().response, Some(json!({ "message": "boom" })));

    let binding = refresher.click(Control::RetryButton).expect("retry is bound");
    assert_eq!(binding.action, Action::Retry);
    assert_eq!(binding.cycle, ticket);
    assert!(refresher.click(Control::PauseButton).is_none());
  }

  #[test]
  fn test_repeated_cycles_do_not_accumulate() {
    let mut refresher = ViewRefresher::new(RecordingSurface::default());

    for _ in 0..3 {
      let ticket = refresher.ticket();
      refresher.apply(ticket, job("running"));
    }

    let state = refresher.current().expect("a cycle is displayed");
    assert_eq!(state.bindings().count(), 1);
    assert_eq!(visible(&refresher), vec![Control::PauseButton]);
    assert_eq!(refresher.surface().hides, 6);
  }

  #[test]
  fn test_reset_hides_previous_controls() {
    let mut refresher = ViewRefresher::new(RecordingSurface::default());
    let first = refresher.ticket();
    refresher.apply(first, job("error"));
    let second = refresher.ticket();
    refresher.apply(second, job("running"));

    assert_eq!(visible(&refresher), vec![Control::PauseButton]);
    assert!(refresher.click(Control::RetryButton).is_none());
    assert_eq!(
      refresher.click(Control::PauseButton).map(|binding| binding.action),
      Some(Action::Pause)
    );
  }

  #[test]
  fn test_stale_tickets_are_dropped() {
    let mut refresher = ViewRefresher::new(RecordingSurface::default());
    let early = refresher.ticket();
    let late = refresher.ticket();

    assert_eq!(refresher.apply(late, job("running")), Applied::Rendered(late));
    assert_eq!(
      refresher.apply(early, job("error")),
      Applied::Stale {
        ticket: early,
        displayed: late
      }
    );

    assert_eq!(visible(&refresher), vec![Control::PauseButton]);
    assert_eq!(refresher.current().map(|state| state.cycle()), Some(late));
  }

  #[test]
  fn test_superseded_by_compares_with_displayed_cycle() {
    let mut refresher = ViewRefresher::new(RecordingSurface::default());
    let first = refresher.ticket();
    assert_eq!(refresher.superseded_by(first), None);

    let second = refresher.ticket();
    let third = refresher.ticket();
    refresher.apply(second, job("running"));

    assert_eq!(refresher.superseded_by(first), Some(second));
    assert_eq!(refresher.superseded_by(second), Some(second));
    assert_eq!(refresher.superseded_by(third), None);
  }

  #[test]
  fn test_settle_success_is_a_full_cycle() {
    let mut refresher = ViewRefresher::new(RecordingSurface::default());
    let initial = refresher.ticket();
    refresher.apply(initial, job("running"));

    let dispatch = refresher.ticket();
    let settled = refresher.settle(dispatch, Ok(DispatchOutcome::Updated(job("paused"))));

    assert_eq!(settled, Settled::Refreshed(Applied::Rendered(dispatch)));
    assert_eq!(visible(&refresher), vec![Control::RetryButton]);
    assert_eq!(
      refresher.current().map(|state| state.job().outcome().to_string()),
      Some("paused".to_string())
    );
  }

  #[test]
  fn test_settle_accepted_requires_refetch() {
    let mut refresher = ViewRefresher::new(RecordingSurface::default());
    let ticket = refresher.ticket();
    assert_eq!(
      refresher.settle(ticket, Ok(DispatchOutcome::Accepted)),
      Settled::Refetch(ticket)
    );
    assert!(refresher.current().is_none());
  }

  #[test]
  fn test_settle_failure_leaves_view_untouched() {
    let mut refresher = ViewRefresher::new(RecordingSurface::default());
    let initial = refresher.ticket();
    refresher.apply(initial, job("error"));

    let dispatch = refresher.ticket();
    let failure = DispatchFailure {
      status: Some("500 Internal Server Error".to_string()),
      body: "kaboom".to_string(),
    };

    assert_eq!(refresher.settle(dispatch, Err(failure)), Settled::Rejected);
    assert_eq!(visible(&refresher), vec![Control::RetryButton]);
    assert_eq!(refresher.surface().response, Some(json!({ "message": "boom" })));
    assert_eq!(refresher.current().map(|state| state.cycle()), Some(initial));
    assert_eq!(refresher.surface().notices.len(), 1);
    assert!(refresher.surface().notices[0].contains("status:500 Internal Server Error"));
    assert!(refresher.surface().notices[0].ends_with("kaboom"));
  }

  #[test]
  fn test_click_before_any_cycle() {
    let refresher = ViewRefresher::new(RecordingSurface::default());
    assert!(refresher.click(Control::RetryButton).is_none());
  }
}
