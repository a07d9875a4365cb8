//! The user-facing dataset container and long-format splitter
//!
//! [`TimeSeriesDataset`] holds a normalized set of per-entity tables and
//! lazily converts each one into a canonical record on iteration. It is
//! immutable after construction; every iteration pass re-derives records
//! from the stored input.

use polars::prelude::*;
use tracing::debug;

use crate::config::DatasetConfig;
use crate::error::{Result, TsFrameError};
use crate::input::{detect_timestamp_column, timestamps_from_column, DataInput};
use crate::period::Frequency;
use crate::record::{build_record, DataRecord};

/// An iterable collection of per-entity time series
#[derive(Debug, Clone)]
pub struct TimeSeriesDataset {
    entries: Vec<(Option<String>, DataFrame)>,
    config: DatasetConfig,
    freq: Frequency,
}

impl TimeSeriesDataset {
    /// Construct from any supported input shape
    ///
    /// Sequence-shaped inputs are normalized into single-value-column
    /// frames; the frequency is taken from the configuration or inferred
    /// from the first entity's time axis.
    pub fn new(input: impl Into<DataInput>, config: DatasetConfig) -> Result<Self> {
        let input = input.into();
        debug!(
            is_series = input.is_series(),
            entities = input.entity_count(),
            "normalizing dataset input"
        );
        let entries = input.into_entries(&config.target)?;
        Self::from_entries(entries, config)
    }

    /// Split a long-format table into per-entity series
    ///
    /// Rows are grouped by the identifier column in first-appearance order
    /// and each group is sorted by its timestamps before record
    /// construction. The dataset length equals the number of distinct
    /// identifier values.
    pub fn from_long_dataframe(
        df: DataFrame,
        item_id: &str,
        config: DatasetConfig,
    ) -> Result<Self> {
        let timestamp_column = match &config.timestamp {
            Some(name) => name.clone(),
            None => detect_timestamp_column(&df)?,
        };
        let groups = df.partition_by_stable([item_id], true)?;
        debug!(entities = groups.len(), identifier = item_id, "split long table");
        let mut entries = Vec::with_capacity(groups.len());
        for group in groups {
            let key = group_key(group.column(item_id)?)?;
            let sorted = group
                .sort([timestamp_column.as_str()], SortMultipleOptions::default())?
                .drop(item_id)?;
            entries.push((Some(key), sorted));
        }
        Self::from_entries(entries, config)
    }

    fn from_entries(
        entries: Vec<(Option<String>, DataFrame)>,
        config: DatasetConfig,
    ) -> Result<Self> {
        let freq = match config.freq {
            Some(freq) => freq,
            None => {
                let (_, first) = entries.first().ok_or_else(|| {
                    TsFrameError::ShapeMismatch(
                        "cannot infer a frequency from an empty dataset".to_string(),
                    )
                })?;
                let timestamp_column = match &config.timestamp {
                    Some(name) => name.clone(),
                    None => detect_timestamp_column(first)?,
                };
                let timestamps = timestamps_from_column(first.column(&timestamp_column)?)?;
                Frequency::infer(&timestamps)?
            }
        };
        debug!(entities = entries.len(), freq = %freq, "constructed dataset");
        Ok(Self {
            entries,
            config,
            freq,
        })
    }

    /// Number of entities, available without iterating
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The resolved dataset frequency
    pub fn freq(&self) -> Frequency {
        self.freq
    }

    /// Lazily convert each entity, in stable input order
    ///
    /// A failing entity surfaces its error at the point it is reached;
    /// earlier records are unaffected. Iteration is restartable and
    /// repeated passes yield identical records.
    pub fn iter(&self) -> impl Iterator<Item = Result<DataRecord>> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(move |(position, (item_id, df))| {
                let label = match item_id {
                    Some(id) => id.clone(),
                    None => format!("series {position}"),
                };
                build_record(df, &self.config, self.freq, item_id.as_deref(), &label)
            })
    }
}

impl<'a> IntoIterator for &'a TimeSeriesDataset {
    type Item = Result<DataRecord>;
    type IntoIter = Box<dyn Iterator<Item = Result<DataRecord>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

// Identifier values may be strings or numbers; both become the record's
// item_id string.
fn group_key(column: &Column) -> Result<String> {
    let value = column.as_materialized_series().get(0)?;
    Ok(match value {
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    })
}
