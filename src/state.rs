use log::{debug, error, info};

use crate::client::ApiClient;
use crate::error::Result;
use crate::reconcile::{reconcile, JobCard};
use crate::types::{Job, Run};

/// Load status of one fetched collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Resource<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Resource::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Resource::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Resource::Loading => "loading",
            Resource::Ready(_) => "ready",
            Resource::Failed(_) => "error",
        }
    }
}

/// Identifies one refresh; later refreshes get larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Outcome of fetching both collections for one refresh.
#[derive(Debug)]
pub struct Snapshot {
    pub ticket: Ticket,
    pub jobs: Result<Vec<Job>>,
    pub runs: Result<Vec<Run>>,
}

/// Fetches jobs and runs with both requests in flight at once.
pub async fn fetch_snapshot(client: &ApiClient, ticket: Ticket) -> Snapshot {
    debug!("Starting refresh {ticket:?}");
    let (jobs, runs) = futures::join!(client.fetch_jobs(), client.fetch_runs());
    Snapshot { ticket, jobs, runs }
}

/// Everything the dashboard renders from.
///
/// A snapshot is applied only if it is newer than the one currently shown,
/// so an older refresh finishing late cannot overwrite newer data. While a
/// refresh is in flight the previous snapshot stays in place. A snapshot
/// always replaces both collections: a failed fetch drops the data it
/// replaces, and cards come back with the next successful refresh.
#[derive(Debug)]
pub struct DashboardState {
    jobs: Resource<Vec<Job>>,
    runs: Resource<Vec<Run>>,
    issued: u64,
    applied: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            jobs: Resource::Loading,
            runs: Resource::Loading,
            issued: 0,
            applied: 0,
        }
    }

    pub fn jobs(&self) -> &Resource<Vec<Job>> {
        &self.jobs
    }

    pub fn runs(&self) -> &Resource<Vec<Run>> {
        &self.runs
    }

    /// Issues the ticket for a new refresh, ordered after all earlier ones.
    pub fn begin_refresh(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Applies a fetched snapshot unless newer data is already shown.
    ///
    /// Returns `false` when the snapshot was stale and discarded.
    pub fn apply(&mut self, snapshot: Snapshot) -> bool {
        if snapshot.ticket <= Ticket(self.applied) {
            info!(
                "Discarding stale refresh {:?} (showing {})",
                snapshot.ticket, self.applied
            );
            return false;
        }
        self.applied = snapshot.ticket.0;

        self.jobs = into_resource("jobs", snapshot.jobs);
        self.runs = into_resource("runs", snapshot.runs);
        debug!(
            "Applied refresh {:?}: jobs {}, runs {}",
            snapshot.ticket,
            self.jobs.status(),
            self.runs.status()
        );
        true
    }

    /// True once both collections have settled, successfully or not.
    pub fn is_settled(&self) -> bool {
        !matches!(self.jobs, Resource::Loading) && !matches!(self.runs, Resource::Loading)
    }

    /// Fetch errors of the current state, labelled by collection.
    pub fn errors(&self) -> Vec<(&'static str, &str)> {
        [("jobs", self.jobs.error()), ("runs", self.runs.error())]
            .into_iter()
            .filter_map(|(name, error)| error.map(|message| (name, message)))
            .collect()
    }

    /// Job cards, available once both collections are ready.
    pub fn cards(&self) -> Option<Vec<JobCard>> {
        let jobs = self.jobs.ready()?;
        let runs = self.runs.ready()?;
        Some(reconcile(jobs, runs))
    }
}

fn into_resource<T>(name: &str, result: Result<T>) -> Resource<T> {
    match result {
        Ok(value) => Resource::Ready(value),
        Err(e) => {
            error!("Failed to fetch {name}: {e}");
            Resource::Failed(e.to_string())
        }
    }
}
