mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::{export_csv, export_json};
pub use progress::{task_spinner, FetchProgress};
pub use styling::{brand, failure, label, success};
pub use summary::{print_dashboard, render_dashboard, Report};

/// Prints the jobboard banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        brand("📋 jobboard"),
        label(env!("CARGO_PKG_VERSION")),
        label("dbt job status dashboard")
    );
}
