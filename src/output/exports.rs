use anyhow::Result;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;

use crate::format::{format_duration, format_start_time};
use crate::present::{group_cards, CardGroup};
use crate::reconcile::JobCard;

/// Flat, serializable form of a job card.
#[derive(Debug, Serialize)]
struct CardRecord<'a> {
    job_name: &'a str,
    project_name: &'a str,
    environment_name: &'a str,
    has_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_hash: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<&'a str>,
    last_ran: String,
    ran_for: String,
}

impl<'a> CardRecord<'a> {
    fn new(card: &'a JobCard, now: DateTime<Utc>) -> Self {
        let run = card.run.as_ref();
        Self {
            job_name: &card.job_name,
            project_name: &card.project_name,
            environment_name: &card.environment_name,
            has_run: card.has_run(),
            git_branch: run.and_then(|r| r.git_branch.as_deref()),
            git_hash: run.and_then(|r| r.git_hash.as_deref()),
            started_at: run.map(|r| r.started_at.as_str()),
            finished_at: run.and_then(|r| r.finished_at.as_deref()),
            is_error: run.map(|r| r.is_error),
            duration: run.map(|r| r.duration.as_str()),
            last_ran: format_start_time(run.map(|r| r.started_at.as_str()), now),
            ran_for: format_duration(run.map(|r| r.duration.as_str())),
        }
    }
}

#[derive(Debug, Serialize)]
struct CardsDocument<'a> {
    generated_at: DateTime<Utc>,
    total: usize,
    groups: IndexMap<CardGroup, Vec<CardRecord<'a>>>,
}

/// Writes the cards as a JSON document grouped by card group.
///
/// All three groups are present as keys, empty or not, so consumers can rely
/// on the shape.
pub fn export_json(
    cards: &[JobCard],
    now: DateTime<Utc>,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    let grouped = group_cards(cards);
    let groups = CardGroup::ALL
        .iter()
        .map(|group| {
            let records = grouped
                .get(*group)
                .iter()
                .copied()
                .map(|card| CardRecord::new(card, now))
                .collect();
            (*group, records)
        })
        .collect();

    let document = CardsDocument {
        generated_at: now,
        total: cards.len(),
        groups,
    };

    let json = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

/// Writes one CSV row per card, in group order.
pub fn export_csv(cards: &[JobCard], now: DateTime<Utc>, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "Group,Job Name,Project,Environment,Has Run,Is Error,Git Branch,Git Hash,Started At,Finished At,Duration,Last Ran,Ran For")?;

    for (group, members) in group_cards(cards).iter() {
        for card in members {
            let record = CardRecord::new(card, now);
            let fields = [
                group.title().to_string(),
                record.job_name.to_string(),
                record.project_name.to_string(),
                record.environment_name.to_string(),
                record.has_run.to_string(),
                record.is_error.map(|e| e.to_string()).unwrap_or_default(),
                record.git_branch.unwrap_or_default().to_string(),
                record.git_hash.unwrap_or_default().to_string(),
                record.started_at.unwrap_or_default().to_string(),
                record.finished_at.unwrap_or_default().to_string(),
                record.duration.unwrap_or_default().to_string(),
                record.last_ran,
                record.ran_for,
            ];
            let line: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
            writeln!(output, "{}", line.join(","))?;
        }
    }

    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
