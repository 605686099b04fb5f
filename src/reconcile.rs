use std::collections::HashMap;

use log::debug;

use crate::types::{Job, Run};

/// Run attributes shown on a job card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub git_branch: Option<String>,
    pub git_hash: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub is_error: bool,
    pub duration: String,
}

impl From<&Run> for RunSummary {
    fn from(run: &Run) -> Self {
        Self {
            git_branch: run.git_branch.clone(),
            git_hash: run.git_hash.clone(),
            started_at: run.started_at.clone(),
            finished_at: run.finished_at.clone(),
            is_error: run.is_error,
            duration: run.duration.clone(),
        }
    }
}

/// View model for a single job card.
///
/// Job attributes are always present; run attributes exist only when a run
/// with the same job name was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCard {
    pub job_name: String,
    pub project_name: String,
    pub environment_name: String,
    pub run: Option<RunSummary>,
}

impl JobCard {
    fn from_job(job: &Job) -> Self {
        Self {
            job_name: job.name.clone(),
            project_name: job.project_name.clone(),
            environment_name: job.environment_name.clone(),
            run: None,
        }
    }

    pub fn has_run(&self) -> bool {
        self.run.is_some()
    }

    /// True only for cards whose attached run failed.
    pub fn is_error(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.is_error)
    }
}

/// Left-joins runs onto jobs by job name.
///
/// Produces exactly one card per job, in job order. When several runs share a
/// job name the first one in `runs` order is attached.
pub fn reconcile(jobs: &[Job], runs: &[Run]) -> Vec<JobCard> {
    let mut first_runs: HashMap<&str, &Run> = HashMap::with_capacity(runs.len());
    for run in runs {
        first_runs.entry(run.job_name.as_str()).or_insert(run);
    }

    let cards: Vec<JobCard> = jobs
        .iter()
        .map(|job| {
            let mut card = JobCard::from_job(job);
            card.run = first_runs.get(job.name.as_str()).map(|run| RunSummary::from(*run));
            card
        })
        .collect();

    debug!(
        "Reconciled {} jobs with {} runs ({} jobs without runs)",
        jobs.len(),
        runs.len(),
        cards.iter().filter(|card| !card.has_run()).count()
    );

    cards
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn create_test_job(name: &str) -> Job {
        Job {
            job_id: 1,
            dbt_id: 100,
            project_name: "analytics".to_string(),
            environment_name: "production".to_string(),
            name: name.to_string(),
        }
    }

    pub(crate) fn create_test_run(job_name: &str, is_error: bool, duration: &str) -> Run {
        Run {
            dbt_id: 200,
            environment_name: "production".to_string(),
            project_name: "analytics".to_string(),
            job_name: job_name.to_string(),
            git_branch: Some("main".to_string()),
            git_hash: Some("abc123".to_string()),
            started_at: "2024-03-01T10:00:00Z".to_string(),
            finished_at: Some("2024-03-01T10:05:30Z".to_string()),
            is_error,
            duration: duration.to_string(),
        }
    }

    #[test]
    fn test_reconcile_one_card_per_job_in_order() {
        let jobs = vec![
            create_test_job("A"),
            create_test_job("B"),
            create_test_job("C"),
        ];
        let runs = vec![create_test_run("B", true, "0:05:30")];

        let cards = reconcile(&jobs, &runs);

        let names: Vec<_> = cards.iter().map(|c| c.job_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert!(!cards[0].has_run());
        assert!(cards[1].has_run());
        assert!(cards[1].is_error());
        assert!(!cards[2].has_run());
    }

    #[test]
    fn test_reconcile_unmatched_job_has_no_run_fields() {
        let jobs = vec![create_test_job("lonely")];
        let runs = vec![create_test_run("other", false, "0:00:10")];

        let cards = reconcile(&jobs, &runs);

        assert_eq!(cards.len(), 1);
        assert!(cards[0].run.is_none());
        assert!(!cards[0].is_error());
        assert_eq!(cards[0].project_name, "analytics");
        assert_eq!(cards[0].environment_name, "production");
    }

    #[test]
    fn test_reconcile_first_matching_run_wins() {
        let jobs = vec![create_test_job("nightly")];
        let runs = vec![
            create_test_run("nightly", false, "0:01:00"),
            create_test_run("nightly", true, "0:02:00"),
        ];

        let cards = reconcile(&jobs, &runs);
        let run = cards[0].run.as_ref().unwrap();

        assert!(!run.is_error);
        assert_eq!(run.duration, "0:01:00");
    }

    #[test]
    fn test_reconcile_matches_exact_name_only() {
        let jobs = vec![create_test_job("Nightly")];
        let runs = vec![
            create_test_run("nightly", false, "0:01:00"),
            create_test_run("Nightly ", false, "0:01:00"),
        ];

        let cards = reconcile(&jobs, &runs);
        assert!(!cards[0].has_run());
    }

    #[test]
    fn test_reconcile_empty_inputs() {
        assert!(reconcile(&[], &[create_test_run("x", false, "0:00:01")]).is_empty());

        let cards = reconcile(&[create_test_job("x")], &[]);
        assert_eq!(cards.len(), 1);
        assert!(!cards[0].has_run());
    }

    #[test]
    fn test_reconcile_shared_run_attaches_to_duplicate_jobs() {
        let jobs = vec![create_test_job("dup"), create_test_job("dup")];
        let runs = vec![create_test_run("dup", false, "0:00:05")];

        let cards = reconcile(&jobs, &runs);
        assert!(cards.iter().all(JobCard::has_run));
    }
}
