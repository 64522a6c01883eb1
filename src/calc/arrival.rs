//! Arrival time and duration of conditions at every mesh node.
//!
//! Over the selected frames `t_0 < ... < t_n`, the arrival of a condition at
//! a node is the first `t_k` where it holds (`t_0` if it already holds in the
//! first frame), NaN if it never does. The duration integrates the 0/1
//! indicator of the condition with the trapezoidal rule, so a condition that
//! switches between two frames counts for half of that interval.

use super::Condition;
use crate::data::{MeshReader, Table};
use crate::error::{ConfigError, NodeFailure, ReadError};
use ahash::AHashMap;
use log::debug;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    #[default]
    Second,
    Minute,
    Hour,
    Day,
    /// Duration as a percentage of the selected time span.
    Percentage,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 5] = [
        TimeUnit::Second,
        TimeUnit::Minute,
        TimeUnit::Hour,
        TimeUnit::Day,
        TimeUnit::Percentage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Second => "second",
            TimeUnit::Minute => "minute",
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::Percentage => "percentage",
        }
    }

    /// Seconds per unit; arrivals in percentage mode stay in seconds.
    fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Second | TimeUnit::Percentage => 1.0,
            TimeUnit::Minute => 60.0,
            TimeUnit::Hour => 3600.0,
            TimeUnit::Day => 86400.0,
        }
    }

    pub fn convert_arrival(&self, seconds: f64) -> f64 {
        seconds / self.seconds()
    }

    pub fn convert_duration(&self, seconds: f64, span: f64) -> f64 {
        match self {
            TimeUnit::Percentage if span > 0.0 => 100.0 * seconds / span,
            TimeUnit::Percentage => 0.0,
            unit => seconds / unit.seconds(),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownTimeUnit(s.to_string()))
    }
}

/// A condition with the names of its arrival and duration columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionColumns {
    pub condition: Condition,
    pub arrival: String,
    pub duration: String,
}

impl ConditionColumns {
    /// Columns named after the condition: `A <condition>` and `D <condition>`,
    /// whitespace removed, cut to 16 characters.
    pub fn with_default_names(condition: Condition) -> Self {
        let tight = condition.tight();
        let cut = |prefix: &str| format!("{prefix} {tight}").chars().take(MAX_NAME_LENGTH).collect();
        Self {
            arrival: cut("A"),
            duration: cut("D"),
            condition,
        }
    }
}

pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 16;

/// Checks a user-given column name against the names already taken.
pub fn validate_column_name(name: &str, taken: &[&str]) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidColumnName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    let length = name.chars().count();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&length) {
        return Err(invalid("the names should be between 2 and 16 characters"));
    }
    if name.contains(',') || name.contains('|') {
        return Err(invalid("the names should not contain comma or vertical bar"));
    }
    if taken.contains(&name) {
        return Err(invalid("duplicated name"));
    }
    Ok(())
}

/// Checks a whole condition table: unique conditions, valid and unique names.
pub fn validate_columns(columns: &[ConditionColumns]) -> Result<(), ConfigError> {
    let mut seen_conditions = BTreeSet::new();
    let mut taken: Vec<&str> = Vec::new();
    for column in columns {
        let text = column.condition.to_string();
        if !seen_conditions.insert(text.clone()) {
            return Err(ConfigError::DuplicateCondition(text));
        }
        for name in [column.arrival.as_str(), column.duration.as_str()] {
            validate_column_name(name, &taken)?;
            taken.push(name);
        }
    }
    Ok(())
}

struct NodeTracker {
    arrival: Vec<f64>,
    duration: Vec<f64>,
    previous: Vec<bool>,
}

pub struct ArrivalDurationCalculator<'a> {
    pub columns: &'a [ConditionColumns],
    pub time_unit: TimeUnit,
}

impl<'a> ArrivalDurationCalculator<'a> {
    pub fn new(columns: &'a [ConditionColumns], time_unit: TimeUnit) -> Self {
        Self { columns, time_unit }
    }

    pub fn required_variables(&self) -> BTreeSet<String> {
        self.columns
            .iter()
            .flat_map(|c| c.condition.required_variables())
            .collect()
    }

    pub fn csv_header(&self) -> Vec<String> {
        let mut header: Vec<String> = ["node", "x", "y"].iter().map(|s| s.to_string()).collect();
        for column in self.columns {
            header.push(column.arrival.clone());
            header.push(column.duration.clone());
        }
        header
    }

    pub fn run(
        &self,
        reader: &dyn MeshReader,
        time_indices: &[usize],
        progress: &mut dyn FnMut(f64),
    ) -> Result<Table, NodeFailure> {
        let header = reader.header();
        let nb_nodes = header.nb_nodes();
        let vars = self.required_variables();
        let time = reader.time();

        let mut trackers: Vec<NodeTracker> = self
            .columns
            .iter()
            .map(|_| NodeTracker {
                arrival: vec![f64::NAN; nb_nodes],
                duration: vec![0.0; nb_nodes],
                previous: vec![false; nb_nodes],
            })
            .collect();

        let mut previous_time: Option<f64> = None;
        for (i, &frame) in time_indices.iter().enumerate() {
            let t = *time
                .get(frame)
                .ok_or_else(|| ReadError::Request(format!("Frame {frame} does not exist")))?;
            let mut values = AHashMap::new();
            for var in &vars {
                values.insert(var.clone(), reader.read_nodal_values(frame, var, nb_nodes)?);
            }
            for (column, tracker) in self.columns.iter().zip(trackers.iter_mut()) {
                let holds = column.condition.evaluate(&values, nb_nodes)?;
                for node in 0..nb_nodes {
                    if holds[node] && tracker.arrival[node].is_nan() {
                        tracker.arrival[node] = t;
                    }
                    if let Some(t_prev) = previous_time {
                        let both = f64::from(u8::from(tracker.previous[node]) + u8::from(holds[node]));
                        tracker.duration[node] += (t - t_prev) * both / 2.0;
                    }
                }
                tracker.previous = holds;
            }
            previous_time = Some(t);
            progress(100.0 * (i + 1) as f64 / time_indices.len() as f64);
        }

        let span = match (time_indices.first(), time_indices.last()) {
            (Some(&first), Some(&last)) => time[last] - time[first],
            _ => 0.0,
        };
        let mut table = Table::new(self.csv_header());
        for node in 0..nb_nodes {
            let mut row = vec![node as f64, header.x[node], header.y[node]];
            for tracker in &trackers {
                row.push(self.time_unit.convert_arrival(tracker.arrival[node]));
                row.push(self.time_unit.convert_duration(tracker.duration[node], span));
            }
            table.push_row(row);
        }
        debug!(
            "Computed arrival and duration of {} conditions over {} frames",
            self.columns.len(),
            time_indices.len()
        );
        Ok(table)
    }
}
