use serde_json::Value;
use std::{collections::BTreeSet, io};

use crate::dispatcher::DispatchFailure;
use crate::refresher::Surface;
use crate::renderer::Control;

/// A surface that keeps what it was told and writes it out as plain text. Payload trees are
/// printed as indented json.
#[derive(Debug, Default)]
pub struct TerminalSurface {
  visible: BTreeSet<Control>,
  job_type: Option<String>,
  document: Option<Value>,
  request: Option<Value>,
  response: Option<Value>,
  notices: Vec<String>,
  include_document: bool,
}

impl TerminalSurface {
  pub fn new(include_document: bool) -> Self {
    Self {
      include_document,
      ..Default::default()
    }
  }

  fn pretty(value: &Value) -> io::Result<String> {
    serde_json::to_string_pretty(value).map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
  }

  /// Writes the current state of the view.
  pub fn write_to<W>(&mut self, mut writer: W) -> io::Result<()>
  where
    W: io::Write,
  {
    for notice in self.notices.drain(..) {
      writeln!(writer, "{notice}")?;
      writeln!(writer)?;
    }

    let job_type = match self.job_type.as_ref() {
      Some(job_type) => job_type,
      None => return Ok(()),
    };

    let controls = self
      .visible
      .iter()
      .map(|control| control.label().to_lowercase())
      .collect::<Vec<String>>();

    writeln!(writer, "job type: {job_type}")?;
    writeln!(writer, "controls: [{}]", controls.join(", "))?;

    if self.include_document {
      if let Some(document) = self.document.as_ref() {
        writeln!(writer, "--- job")?;
        writeln!(writer, "{}", Self::pretty(document)?)?;
      }
    }

    if let Some(request) = self.request.as_ref() {
      writeln!(writer, "--- request")?;
      writeln!(writer, "{}", Self::pretty(request)?)?;
    }

    writeln!(writer, "--- response")?;
    match self.response.as_ref() {
      Some(response) => writeln!(writer, "{}", Self::pretty(response)?),
      None => writeln!(writer, "(empty)"),
    }
  }
}

impl Surface for TerminalSurface {
  fn hide(&mut self, control: Control) {
    self.visible.remove(&control);
  }

  fn show(&mut self, control: Control) {
    self.visible.insert(control);
  }

  fn label(&mut self, job_type: &str) {
    self.job_type = Some(job_type.to_string());
  }

  fn document(&mut self, document: &Value) {
    self.document = Some(document.clone());
  }

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
