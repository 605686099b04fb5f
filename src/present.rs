use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::reconcile::JobCard;

/// Bucket a job card is displayed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardGroup {
    Errors,
    Successful,
    NoRuns,
}

impl CardGroup {
    /// Display order of the groups on the dashboard.
    pub const ALL: [CardGroup; 3] = [CardGroup::Errors, CardGroup::Successful, CardGroup::NoRuns];

    pub fn of(card: &JobCard) -> Self {
        match &card.run {
            Some(run) if run.is_error => CardGroup::Errors,
            Some(_) => CardGroup::Successful,
            None => CardGroup::NoRuns,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            CardGroup::Errors => "Errors",
            CardGroup::Successful => "Successful",
            CardGroup::NoRuns => "No Runs",
        }
    }
}

impl fmt::Display for CardGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// How many empty slots close off the last row of a card grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PaddingPolicy {
    /// Round up to the next multiple of the column count; a full last row
    /// gets no filler.
    #[default]
    Minimal,
    /// `columns - (n % columns)`: a full last row is followed by a whole row
    /// of filler slots.
    FullRow,
}

impl PaddingPolicy {
    pub fn filler_slots(self, cards: usize, columns: usize) -> usize {
        if columns == 0 {
            return 0;
        }
        let remainder = columns - cards % columns;
        match self {
            PaddingPolicy::Minimal => remainder % columns,
            PaddingPolicy::FullRow => remainder,
        }
    }
}

/// Shape of the card grid each group is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: usize,
    pub padding: PaddingPolicy,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 4,
            padding: PaddingPolicy::default(),
        }
    }
}

impl GridLayout {
    pub fn filler_slots(&self, cards: usize) -> usize {
        self.padding.filler_slots(cards, self.columns)
    }
}

/// Job cards partitioned by [`CardGroup`], keeping input order inside each
/// group. Groups without cards are absent.
#[derive(Debug, Default)]
pub struct Groups<'a> {
    groups: IndexMap<CardGroup, Vec<&'a JobCard>>,
}

impl<'a> Groups<'a> {
    /// Non-empty groups in display order.
    pub fn iter(&self) -> impl Iterator<Item = (CardGroup, &[&'a JobCard])> {
        self.groups.iter().map(|(group, cards)| (*group, cards.as_slice()))
    }

    pub fn get(&self, group: CardGroup) -> &[&'a JobCard] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Partitions cards into errored, successful and never-run groups.
pub fn group_cards(cards: &[JobCard]) -> Groups<'_> {
    let mut buckets: IndexMap<CardGroup, Vec<&JobCard>> = CardGroup::ALL
        .iter()
        .map(|group| (*group, Vec::new()))
        .collect();

    for card in cards {
        buckets.entry(CardGroup::of(card)).or_default().push(card);
    }

    buckets.retain(|_, cards| !cards.is_empty());
    Groups { groups: buckets }
}
