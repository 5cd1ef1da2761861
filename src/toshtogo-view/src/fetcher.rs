use std::io;

/// Builds the resource url of a single job relative to the api base.
pub(crate) fn job_resource<S>(base: &url::Url, job_id: S) -> io::Result<url::Url>
where
  S: AsRef<str>,
{
  let mut resource = base.clone();

  resource
    .path_segments_mut()
    .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("'{base}' cannot be a base")))?
    .pop_if_empty()
    .extend(crate::constants::JOB_RESOURCE_SEGMENTS)
    .push(job_id.as_ref());

  Ok(resource)
}

/// Views are addressed by location; the job they show is the last (non-empty) path segment.
pub fn job_id_from_location(location: &url::Url) -> Option<String> {
  location
    .path_segments()?
    .filter(|segment| !segment.is_empty())
    .last()
    .map(|segment| segment.to_string())
}

/// Command line users may paste either a bare id or the location of a job view.
pub fn job_id_from_target<S>(target: S) -> Option<String>
where
  S: AsRef<str>,
{
  let target = target.as_ref().trim();

  match url::Url::parse(target) {
    Ok(location) if !location.cannot_be_a_base() => job_id_from_location(&location),
    _ => Some(target.to_string()).filter(|id| !id.is_empty()),
  }
}

/// Retrieves jobs from the backend.
#[derive(Debug, Clone)]
pub struct JobFetcher {
  base: url::Url,
}

impl JobFetcher {
  pub fn new(base: url::Url) -> Self {
    Self { base }
  }

  /// Fetches the current representation of a job. Any non-success status is treated as a failure,
  /// as is a body that cannot be parsed into a job.
  pub async fn fetch<S>(&self, job_id: S) -> io::Result<crate::job::Job>
  where
    S: AsRef<str>,
  {
    let uri = job_resource(&self.base, job_id.as_ref())?;
    log::debug!("fetching job '{}' from '{uri}'", job_id.as_ref());

    let mut res = surf::get(&uri)
      .header("Accept", "application/json")
      .await
      .map_err(|error| {
        log::warn!("job fetch transport failure - {error}");
        io::Error::new(io::ErrorKind::Other, error.to_string())
      })?;

    let status = res.status();
    let body = res
      .body_string()
      .await
      .map_err(|error| io::Error::new(io::ErrorKind::Other, error.to_string()))?;

    if !status.is_success() {
      log::warn!("bad job fetch status '{status}' - '{body}'");
      return Err(io::Error::new(
        io::ErrorKind::Other,
        format!("bad status from job fetch - '{status}' {body}"),
      ));
    }

    log::trace!("job document - '{body}'");

    serde_json::from_str::<crate::job::Job>(&body).map_err(|error| {
      log::warn!("unable to parse job document - {error}");
      io::Error::new(io::ErrorKind::InvalidData, format!("invalid job document - {error}"))
    })
  }

  /// The default entry point: fetch whichever job the location points at.
  pub async fn fetch_location(&self, location: &url::Url) -> io::Result<crate::job::Job> {
    let job_id = job_id_from_location(location).ok_or_else(|| {
      io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("no job id in location '{location}'"),
      )
    })?;

    self.fetch(job_id).await
  }
}
