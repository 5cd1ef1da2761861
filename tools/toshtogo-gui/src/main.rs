#![deny(unsafe_code)]

//! A desktop window showing a single toshtogo job. Loads are awaited before anything is drawn;
//! commands run in the background and the window stays usable while they are in flight.

use anyhow::Context;
use clap::Parser;
use iced::Application;

use toshtogo::{
  ActionDispatcher, Applied, Control, DispatchFailure, DispatchOutcome, Job, JobFetcher, Settled, Ticket,
  ViewRefresher,
};

mod arguments;
use arguments::CommandLineArguments;

mod panel;
use panel::Panel;

#[derive(Debug, Clone)]
enum JobViewMessage {
  Reload,
  Loaded(Ticket, Result<Job, String>),
  Clicked(Control),
  Dispatched(Ticket, Result<DispatchOutcome, DispatchFailure>),
  DismissNotice,
}

struct JobViewInit {
  job_id: String,
  fetcher: JobFetcher,
  dispatcher: ActionDispatcher,
}

struct JobView {
  job_id: String,
  fetcher: JobFetcher,
  dispatcher: ActionDispatcher,
  refresher: ViewRefresher<Panel>,
}

impl JobView {
  /// Starts a fresh cycle.
  fn load(&mut self) -> iced::Command<JobViewMessage> {
    let ticket = self.refresher.ticket();
    self.fetch(ticket)
  }

  fn fetch(&self, ticket: Ticket) -> iced::Command<JobViewMessage> {
    let fetcher = self.fetcher.clone();
    let job_id = self.job_id.clone();
    log::debug!("loading job '{job_id}' for cycle {}", ticket.sequence());

    iced::Command::perform(
      async move { fetcher.fetch(job_id).await.map_err(|error| error.to_string()) },
      move |result| JobViewMessage::Loaded(ticket, result),
    )
  }

  fn applied(&self, applied: Applied) {
    if let Applied::Stale { ticket, displayed } = applied {
      log::info!(
        "ignored result of cycle {} (cycle {} is newer)",
        ticket.sequence(),
        displayed.sequence()
      );
    }
  }
}

impl iced::Application for JobView {
  type Message = JobViewMessage;
  type Executor = iced::executor::Default;
  type Theme = iced::Theme;
  type Flags = JobViewInit;

  fn new(flags: Self::Flags) -> (Self, iced::Command<Self::Message>) {
    let mut view = Self {
      job_id: flags.job_id,
      fetcher: flags.fetcher,
      dispatcher: flags.dispatcher,
      refresher: ViewRefresher::new(Panel::default()),
    };
    let command = view.load();
    (view, command)
  }

  fn title(&self) -> String {
    match self.refresher.current() {
      Some(state) => format!("{} ({})", state.job().job_type(), state.job().outcome()),
      None => format!("job {}", self.job_id),
    }
  }

  fn update(&mut self, message: Self::Message) -> iced::Command<Self::Message> {
    match message {
      JobViewMessage::Reload => self.load(),

      JobViewMessage::Loaded(ticket, result) => {
        if let Err(error) = result.as_ref() {
          log::error!("unable to load job '{}' for cycle {} - {error}", self.job_id, ticket.sequence());
        }

        if let Some(displayed) = panel::loaded(&mut self.refresher, ticket, result) {
          self.applied(Applied::Stale { ticket, displayed });
        }
        iced::Command::none()
      }

      JobViewMessage::Clicked(control) => {
        let binding = match self.refresher.click(control) {
          Some(binding) => binding,
          None => return iced::Command::none(),
        };

        let ticket = self.refresher.ticket();
        let dispatcher = self.dispatcher.clone();

        iced::Command::perform(
          async move { dispatcher.dispatch(&binding.job, binding.action).await },
          move |result| JobViewMessage::Dispatched(ticket, result),
        )
      }

      JobViewMessage::Dispatched(ticket, result) => match self.refresher.settle(ticket, result) {
        Settled::Refetch(ticket) => self.fetch(ticket),
        Settled::Refreshed(applied) => {
          self.applied(applied);
          iced::Command::none()
        }
        Settled::Rejected => iced::Command::none(),
      },

      JobViewMessage::DismissNotice => {
        self.refresher.surface_mut().dismiss();
        iced::Command::none()
      }
    }
  }

  fn view(&self) -> iced::Element<Self::Message> {
    use iced::widget::{button, scrollable, text, Column, Row};

    let panel = self.refresher.surface();
    let mut content = Column::new().spacing(12).padding(16);

    if let Some(error) = panel.page_error() {
      content = content.push(text(format!("unable to load job - {error}")));
    }

    if let Some(notice) = panel.notice() {
      content = content.push(
        iced::widget::column![
          text(notice),
          button(text("Dismiss")).on_press(JobViewMessage::DismissNotice)
        ]
        .spacing(6),
      );
    }

    let mut controls = Row::new().spacing(10);
    for control in Control::ALL {
      if panel.is_visible(control) {
        controls = controls.push(button(text(control.label())).on_press(JobViewMessage::Clicked(control)));
      }
    }
    controls = controls.push(button(text("Reload")).on_press(JobViewMessage::Reload));

    content = content
      .push(text(panel.job_type()).size(28))
      .push(controls)
      .push(text("Request").size(20))
      .push(text(panel.request_tree()))
      .push(text("Response").size(20))
      .push(text(panel.response_tree().unwrap_or("")))
      .push(text("Job").size(20))
      .push(text(panel.document_tree()));

    scrollable(content).into()
  }
}

fn main() -> anyhow::Result<()> {
  let load_env = std::fs::metadata(".env").map(|meta| meta.is_file()).unwrap_or(false);

  if load_env {
    let env_result = dotenv::dotenv();
    println!(".env loaded? {:?}", env_result.is_ok());
  }

  env_logger::init();
  let args = CommandLineArguments::parse();

  let config = toshtogo::config::load(&args.config, args.api.as_deref())
    .with_context(|| format!("unable to load configuration from '{}'", args.config))?;

  let job_id = toshtogo::job_id_from_target(&args.target)
    .ok_or_else(|| anyhow::Error::msg(format!("no job id in '{}'", args.target)))?;

  let flags = JobViewInit {
    job_id,
    fetcher: config.fetcher().with_context(|| "bad api configuration")?,
    dispatcher: config.dispatcher().with_context(|| "bad api configuration")?,
  };

  let mut settings = iced::Settings::with_flags(flags);
  settings.window.size = (900, 700);
  JobView::run(settings).map_err(|error| anyhow::Error::msg(error.to_string()))
}
