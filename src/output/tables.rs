use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::format::{format_duration, format_start_time};
use crate::present::{CardGroup, GridLayout};
use crate::reconcile::JobCard;

const SHORT_HASH_LEN: usize = 7;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn group_color(group: CardGroup) -> TableColor {
    match group {
        CardGroup::Errors => TableColor::Red,
        CardGroup::Successful => TableColor::Green,
        CardGroup::NoRuns => TableColor::DarkGrey,
    }
}

/// Text of a single job card.
pub fn card_text(card: &JobCard, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        card.job_name.clone(),
        format!("{} / {}", card.project_name, card.environment_name),
    ];

    match &card.run {
        Some(run) => {
            lines.push(format!(
                "Last ran: {}",
                format_start_time(Some(&run.started_at), now)
            ));
            lines.push(format!("Ran for: {}", format_duration(Some(&run.duration))));
            if let Some(revision) = revision(run.git_branch.as_deref(), run.git_hash.as_deref()) {
                lines.push(revision);
            }
        }
        None => lines.push("No Runs on Record".to_string()),
    }

    lines.join("\n")
}

fn revision(branch: Option<&str>, hash: Option<&str>) -> Option<String> {
    let hash = hash.map(|hash| hash.get(..SHORT_HASH_LEN).unwrap_or(hash));
    match (branch, hash) {
        (Some(branch), Some(hash)) => Some(format!("{branch} @ {hash}")),
        (Some(branch), None) => Some(branch.to_string()),
        (None, Some(hash)) => Some(format!("@ {hash}")),
        (None, None) => None,
    }
}

pub fn card_cell(card: &JobCard, now: DateTime<Utc>) -> Cell {
    Cell::new(card_text(card, now)).fg(group_color(CardGroup::of(card)))
}

/// Lays the cards of one group out in rows of `layout.columns`, followed by
/// the filler slots the padding policy asks for.
pub fn card_grid(cards: &[&JobCard], layout: GridLayout, now: DateTime<Utc>) -> Table {
    let columns = layout.columns.max(1);
    let fillers = layout.filler_slots(cards.len());

    let cells: Vec<Cell> = cards
        .iter()
        .map(|card| card_cell(card, now))
        .chain(std::iter::repeat_with(|| Cell::new("")).take(fillers))
        .collect();

    let mut table = create_table();
    let mut cells = cells.into_iter().peekable();
    while cells.peek().is_some() {
        table.add_row(cells.by_ref().take(columns).collect::<Vec<_>>());
    }
    table
}
