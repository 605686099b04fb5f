use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::present::{group_cards, CardGroup, GridLayout};
use crate::reconcile::JobCard;

use super::styling::{for_group, heading, label, link, notice};
use super::tables::card_grid;

/// Everything needed to draw one dashboard frame.
pub struct Report<'a> {
    pub backend: &'a str,
    pub generated_at: DateTime<Utc>,
    pub cards: &'a [JobCard],
    pub layout: GridLayout,
}

/// Prints the dashboard to stdout.
///
/// Shows an overview with counts per group, then one card grid per
/// non-empty group in the order Errors, Successful, No Runs.
pub fn print_dashboard(report: &Report<'_>) {
    println!("{}", render_dashboard(report));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", heading(emoji), heading(title).underlined());
}

fn group_emoji(group: CardGroup) -> &'static str {
    match group {
        CardGroup::Errors => "❌",
        CardGroup::Successful => "✅",
        CardGroup::NoRuns => "💤",
    }
}

pub fn render_dashboard(report: &Report<'_>) -> String {
    let mut output = String::new();
    let groups = group_cards(report.cards);

    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        label("Backend:"),
        link(report.backend),
        label("Jobs:"),
        notice(report.cards.len()),
        label("Errors:"),
        for_group(CardGroup::Errors, groups.get(CardGroup::Errors).len()),
        label("Successful:"),
        for_group(CardGroup::Successful, groups.get(CardGroup::Successful).len()),
        label("No runs:"),
        for_group(CardGroup::NoRuns, groups.get(CardGroup::NoRuns).len()),
        label("Refreshed:"),
        label(report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))
    );

    if groups.is_empty() {
        let _ = writeln!(output, "{}", notice("No jobs found."));
        return output;
    }

    for (group, cards) in groups.iter() {
        add_section_header(
            &mut output,
            group_emoji(group),
            &format!("{} ({})", group.title(), cards.len()),
        );
        let grid = card_grid(cards, report.layout, report.generated_at);
        let _ = writeln!(output, "{grid}\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::reconcile;
    use crate::reconcile::tests::{create_test_job, create_test_run};
    use chrono::TimeZone;

    fn render(cards: &[JobCard]) -> String {
        console::set_colors_enabled(false);
        render_dashboard(&Report {
            backend: "http://localhost:8000/",
            generated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            cards,
            layout: GridLayout::default(),
        })
    }

    #[test]
    fn test_render_dashboard_empty() {
        let output = render(&[]);

        assert!(output.contains("http://localhost:8000/"));
        assert!(output.contains("Jobs:"));
        assert!(output.contains("No jobs found."));
        assert!(!output.contains("Errors ("));
    }

    #[test]
    fn test_render_dashboard_groups() {
        let jobs = vec![
            create_test_job("A"),
            create_test_job("B"),
            create_test_job("C"),
        ];
        let runs = vec![create_test_run("B", true, "0:05:30")];
        let cards = reconcile(&jobs, &runs);

        let output = render(&cards);

        assert!(output.contains("Errors (1)"));
        assert!(output.contains("No Runs (2)"));
        assert!(!output.contains("Successful ("));
        assert!(output.contains("5 minutes 30 seconds"));
        assert!(output.contains("2 hours 0 minutes ago"));
        assert!(output.contains("No Runs on Record"));

        let errors_at = output.find("Errors (1)").unwrap();
        let no_runs_at = output.find("No Runs (2)").unwrap();
        assert!(errors_at < no_runs_at);
    }

    #[test]
    fn test_render_dashboard_refresh_time() {
        let output = render(&[]);
        assert!(output.contains("2024-03-01 12:00:00 UTC"));
    }
}
