use std::collections::HashSet;

use crate::error::StatsError;
use crate::table::{Cell, Table};

pub const PLAYER_COLUMN: &str = "Player";

/// Categories plotted on the player radar, in display order.
pub const RADAR_CATEGORIES: [&str; 6] = [
    "Tackles Won",
    "Clearances/Saves",
    "Crosses to box",
    "Ball lost",
    "Failed passes",
    "Fouls Won",
];

const TOP_PERFORMERS: usize = 5;

/// One row of a table, addressed by its player name.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    /// Index of the row in the source table.
    pub row: usize,
    pub name: String,
    pub cells: Vec<(String, Cell)>,
}

impl PlayerRecord {
    fn from_row(table: &Table, row: usize) -> Option<Self> {
        let cells = table.row(row)?;
        let name = table
            .cell(row, PLAYER_COLUMN)
            .map(|c| c.to_string())
            .unwrap_or_default();
        Some(Self { row, name, cells })
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    /// Integer value of a stat, zero when absent or unreadable.
    pub fn stat(&self, column: &str) -> i64 {
        safe_int_convert(self.get(column))
    }
}

/// Returns the first row whose `Player` cell equals `name`.
pub fn lookup_player(table: &Table, name: &str) -> Result<PlayerRecord, StatsError> {
    let Some(players) = table.column(PLAYER_COLUMN) else {
        return Err(StatsError::player(name));
    };
    (0..table.row_count())
        .find(|row| {
            players
                .cell(*row)
                .is_some_and(|cell| cell.to_string() == name)
        })
        .and_then(|row| PlayerRecord::from_row(table, row))
        .ok_or_else(|| StatsError::player(name))
}

/// Unique player names in first-seen order.
pub fn player_names(table: &Table) -> Vec<String> {
    let Some(players) = table.column(PLAYER_COLUMN) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in 0..players.len() {
        let Some(cell) = players.cell(row) else {
            continue;
        };
        let name = cell.to_string();
        if seen.insert(name.clone()) {
            out.push(name);
        }
    }
    out
}

/// Integer view of a cell that never fails.
///
/// Numbers truncate toward zero, non-finite numbers give 0, text must be a
/// plain integer and anything else (including a missing cell) gives 0.
pub fn safe_int_convert(value: Option<&Cell>) -> i64 {
    match value {
        Some(Cell::Number(v)) if v.is_finite() => v.trunc() as i64,
        Some(Cell::Number(_)) => 0,
        Some(Cell::Text(s)) => s.trim().parse::<i64>().unwrap_or(0),
        None => 0,
    }
}

/// Percentage of shots on target, to one decimal; 0.0 with no shots.
pub fn shot_accuracy(on_target: i64, off_target: i64) -> f64 {
    if on_target.saturating_add(off_target) <= 0 {
        return 0.0;
    }
    let pct = on_target as f64 / (on_target as f64 + off_target as f64) * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Column sums over every numeric column, in table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamTotals {
    sums: Vec<(String, f64)>,
}

impl TeamTotals {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.sums
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| *v)
    }

    pub fn stat(&self, column: &str) -> i64 {
        self.get(column)
            .map(|v| safe_int_convert(Some(&Cell::Number(v))))
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.sums.iter().map(|(name, v)| (name.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }
}

pub fn team_totals(table: &Table) -> TeamTotals {
    let mut seen = HashSet::new();
    let sums = table
        .columns()
        .iter()
        .filter(|c| c.is_numeric())
        .filter(|c| seen.insert(c.name.clone()))
        .map(|c| (c.name.clone(), c.numbers().iter().sum()))
        .collect();
    TeamTotals { sums }
}

/// The `n` rows with the largest `column` values, highest first.
///
/// Ties keep their original row order. An empty table gives an empty list
/// whatever the column; otherwise the column must exist.
pub fn top_n(table: &Table, column: &str, n: usize) -> Result<Vec<PlayerRecord>, StatsError> {
    if table.is_empty() || n == 0 {
        return Ok(Vec::new());
    }
    let values = table
        .column(column)
        .ok_or_else(|| StatsError::column(column))?
        .numbers();

    let mut order: Vec<usize> = (0..values.len()).collect();
    // partial_cmp keeps -0.0 and 0.0 tied; values are finite after parsing.
    order.sort_by(|a, b| {
        values[*b]
            .partial_cmp(&values[*a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(order
        .into_iter()
        .take(n)
        .filter_map(|row| PlayerRecord::from_row(table, row))
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShootingStats {
    pub on_target: i64,
    pub off_target: i64,
    pub total: i64,
    pub accuracy: f64,
}

impl ShootingStats {
    pub fn new(on_target: i64, off_target: i64) -> Self {
        Self {
            on_target,
            off_target,
            total: on_target.saturating_add(off_target),
            accuracy: shot_accuracy(on_target, off_target),
        }
    }
}

/// Everything the player view shows for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProfile {
    pub name: String,
    pub goals: i64,
    pub assists: i64,
    pub shooting: ShootingStats,
    pub key_passes: i64,
    pub dribbles: i64,
    pub tackles_won: i64,
    pub fouls_committed: i64,
    pub fouls_won: i64,
    pub clearances_saves: i64,
    pub ball_lost: i64,
    pub failed_passes: i64,
    pub crosses_to_box: i64,
    pub radar: Vec<(&'static str, i64)>,
}

impl PlayerProfile {
    /// Upper bound for the radar axis.
    pub fn radar_max(&self) -> i64 {
        self.radar.iter().map(|(_, v)| *v).max().unwrap_or(0).saturating_add(5)
    }
}

pub fn player_profile(record: &PlayerRecord) -> PlayerProfile {
    PlayerProfile {
        name: record.name.clone(),
        goals: record.stat("Goals"),
        assists: record.stat("Assists"),
        shooting: ShootingStats::new(
            record.stat("Shots on target"),
            record.stat("Shots off target"),
        ),
        key_passes: record.stat("Key Passes"),
        dribbles: record.stat("Dribbles"),
        tackles_won: record.stat("Tackles Won"),
        fouls_committed: record.stat("Fouls Committed"),
        fouls_won: record.stat("Fouls Won"),
        clearances_saves: record.stat("Clearances/Saves"),
        ball_lost: record.stat("Ball lost"),
        failed_passes: record.stat("Failed passes"),
        crosses_to_box: record.stat("Crosses to box"),
        radar: RADAR_CATEGORIES
            .iter()
            .map(|cat| (*cat, record.stat(cat)))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Performer {
    pub name: String,
    pub value: i64,
}

/// Team view: totals as integers plus the leaderboards.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSummary {
    pub totals: TeamTotals,
    pub goals: i64,
    pub assists: i64,
    pub shooting: ShootingStats,
    pub key_passes: i64,
    pub dribbles: i64,
    pub tackles_won: i64,
    pub fouls_committed: i64,
    pub fouls_won: i64,
    pub clearances_saves: i64,
    pub ball_lost: i64,
    pub failed_passes: i64,
    pub crosses_to_box: i64,
    pub top_scorers: Vec<Performer>,
    pub top_assisters: Vec<Performer>,
}

pub fn team_summary(table: &Table) -> TeamSummary {
    let totals = team_totals(table);
    let shooting = ShootingStats::new(
        totals.stat("Shots on target"),
        totals.stat("Shots off target"),
    );
    TeamSummary {
        goals: totals.stat("Goals"),
        assists: totals.stat("Assists"),
        shooting,
        key_passes: totals.stat("Key Passes"),
        dribbles: totals.stat("Dribbles"),
        tackles_won: totals.stat("Tackles Won"),
        fouls_committed: totals.stat("Fouls Committed"),
        fouls_won: totals.stat("Fouls Won"),
        clearances_saves: totals.stat("Clearances/Saves"),
        ball_lost: totals.stat("Ball lost"),
        failed_passes: totals.stat("Failed passes"),
        crosses_to_box: totals.stat("Crosses to box"),
        top_scorers: performers(table, "Goals"),
        top_assisters: performers(table, "Assists"),
        totals,
    }
}

fn performers(table: &Table, column: &str) -> Vec<Performer> {
    match top_n(table, column, TOP_PERFORMERS) {
        Ok(records) => records
            .into_iter()
            .map(|r| Performer {
                value: r.stat(column),
                name: r.name,
            })
            .collect(),
        Err(err) => {
            log::debug!("no leaderboard for {column}: {err}");
            Vec::new()
        }
    }
}
