use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{failure, notice, success};

/// Spinner shown on stderr while jobs and runs are being fetched.
pub struct FetchProgress {
    pb: ProgressBar,
}

impl FetchProgress {
    pub fn start(base_url: &str) -> Self {
        let pb = create_spinner(
            notice(format!("Fetching jobs and runs from {base_url}")).to_string(),
        );
        Self { pb }
    }

    pub fn finish(self, jobs: Option<usize>, runs: Option<usize>) {
        match (jobs, runs) {
            (Some(jobs), Some(runs)) => self.pb.finish_with_message(
                success(format!("Fetched {jobs} jobs and {runs} runs ✓")).to_string(),
            ),
            _ => self
                .pb
                .finish_with_message(failure("Fetching failed ✗").to_string()),
        }
    }
}

/// Spinner for a single backend call such as a refresh trigger.
pub fn task_spinner(message: &str) -> ProgressBar {
    create_spinner(notice(message).to_string())
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
