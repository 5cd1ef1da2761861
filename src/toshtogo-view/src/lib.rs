//! A view of a single job held by a toshtogo backend: fetch it, render it, and offer the lifecycle
//! commands that make sense for its current outcome.

/// Paths, parameter names and default agent identity.
pub mod constants;

/// The `toml` configuration schema shared by the binaries.
pub mod config;

/// The job record.
pub mod job;
pub use job::{Job, JobResponse, Outcome};

/// Loads jobs from the backend.
pub mod fetcher;
pub use fetcher::{job_id_from_location, job_id_from_target, JobFetcher};

/// The pure mapping from a job to what the view displays.
pub mod renderer;
pub use renderer::{render, Action, Control, Directives, Visibility};

/// Sends lifecycle commands.
pub mod dispatcher;
pub use dispatcher::{ActionDispatcher, DispatchFailure, DispatchOutcome};

/// The display cycle.
pub mod refresher;
pub use refresher::{Applied, Binding, Settled, Surface, Ticket, ViewRefresher, ViewState};

/// A plain-text surface used by the cli.
pub mod terminal;
