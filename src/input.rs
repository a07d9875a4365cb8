//! Input topologies and sequence-to-table normalization
//!
//! The adapter accepts a closed set of input shapes: a single labeled
//! sequence, collections of sequences, mappings of sequences, or the same
//! three shapes built from two-dimensional frames. Shape is resolved once,
//! at construction, into the [`DataInput`] tagged union; long-format tables
//! enter through [`crate::dataset::TimeSeriesDataset::from_long_dataframe`]
//! instead.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::error::{Result, TsFrameError};

/// Column name synthesized for the time axis when a sequence is normalized
/// into a frame
pub const TIMESTAMP_COL: &str = "timestamp";

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// One labeled time series: a one-dimensional value sequence aligned with a
/// datetime axis
///
/// Polars frames carry no implicit row index, so the time axis of a bare
/// sequence is explicit here.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    index: Vec<NaiveDateTime>,
    values: Series,
}

impl TimeSeries {
    /// Pair a datetime axis with a value sequence of the same length
    pub fn new(index: Vec<NaiveDateTime>, values: Series) -> Result<Self> {
        if index.len() != values.len() {
            return Err(TsFrameError::ShapeMismatch(format!(
                "time index has {} entries but values have {}",
                index.len(),
                values.len()
            )));
        }
        Ok(Self { index, values })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn values(&self) -> &Series {
        &self.values
    }

    /// Convert to a two-column frame: the time axis under
    /// [`TIMESTAMP_COL`] plus one value column with the given name
    pub fn to_frame(&self, value_column: &str) -> Result<DataFrame> {
        let mut values = self.values.clone();
        values.rename(value_column.into());
        let columns = vec![datetime_column(TIMESTAMP_COL, &self.index)?, values.into()];
        Ok(DataFrame::new(columns)?)
    }
}

/// The closed set of supported input shapes, resolved once at construction
///
/// Mapping variants are ordered key/value pairs; insertion order is the
/// iteration order and is never re-sorted.
#[derive(Debug, Clone)]
pub enum DataInput {
    Series(TimeSeries),
    SeriesList(Vec<TimeSeries>),
    SeriesMap(Vec<(String, TimeSeries)>),
    Frame(DataFrame),
    FrameList(Vec<DataFrame>),
    FrameMap(Vec<(String, DataFrame)>),
}

impl DataInput {
    /// True when every leaf is a bare sequence rather than a table
    pub fn is_series(&self) -> bool {
        matches!(
            self,
            DataInput::Series(_) | DataInput::SeriesList(_) | DataInput::SeriesMap(_)
        )
    }

    /// Number of entities this input will produce
    pub fn entity_count(&self) -> usize {
        match self {
            DataInput::Series(_) | DataInput::Frame(_) => 1,
            DataInput::SeriesList(list) => list.len(),
            DataInput::SeriesMap(map) => map.len(),
            DataInput::FrameList(list) => list.len(),
            DataInput::FrameMap(map) => map.len(),
        }
    }

    /// Normalize sequence leaves into single-value-column frames
    ///
    /// The output topology mirrors the input exactly: a scalar stays a
    /// scalar, list order is kept, mapping keys keep insertion order. Frame
    /// variants pass through untouched.
    pub fn into_frames(self, value_column: &str) -> Result<DataInput> {
        Ok(match self {
            DataInput::Series(series) => DataInput::Frame(series.to_frame(value_column)?),
            DataInput::SeriesList(list) => DataInput::FrameList(
                list.iter()
                    .map(|series| series.to_frame(value_column))
                    .collect::<Result<Vec<_>>>()?,
            ),
            DataInput::SeriesMap(map) => DataInput::FrameMap(
                map.into_iter()
                    .map(|(key, series)| Ok((key, series.to_frame(value_column)?)))
                    .collect::<Result<Vec<_>>>()?,
            ),
            other => other,
        })
    }

    /// Flatten into per-entity entries, tagging keyed sources with their key
    pub(crate) fn into_entries(self, value_column: &str) -> Result<Vec<(Option<String>, DataFrame)>> {
        Ok(match self.into_frames(value_column)? {
            DataInput::Frame(df) => vec![(None, df)],
            DataInput::FrameList(list) => list.into_iter().map(|df| (None, df)).collect(),
            DataInput::FrameMap(map) => {
                map.into_iter().map(|(key, df)| (Some(key), df)).collect()
            }
            // into_frames never returns a series variant
            _ => unreachable!("sequence leaves survived normalization"),
        })
    }
}

impl From<TimeSeries> for DataInput {
    fn from(series: TimeSeries) -> Self {
        DataInput::Series(series)
    }
}

impl From<Vec<TimeSeries>> for DataInput {
    fn from(list: Vec<TimeSeries>) -> Self {
        DataInput::SeriesList(list)
    }
}

impl From<Vec<(String, TimeSeries)>> for DataInput {
    fn from(map: Vec<(String, TimeSeries)>) -> Self {
        DataInput::SeriesMap(map)
    }
}

impl From<DataFrame> for DataInput {
    fn from(df: DataFrame) -> Self {
        DataInput::Frame(df)
    }
}

impl From<Vec<DataFrame>> for DataInput {
    fn from(list: Vec<DataFrame>) -> Self {
        DataInput::FrameList(list)
    }
}

impl From<Vec<(String, DataFrame)>> for DataInput {
    fn from(map: Vec<(String, DataFrame)>) -> Self {
        DataInput::FrameMap(map)
    }
}

/// Build a millisecond-datetime column from a chrono axis
pub fn datetime_column(name: &str, index: &[NaiveDateTime]) -> Result<Column> {
    let millis: Vec<i64> = index.iter().map(|t| t.and_utc().timestamp_millis()).collect();
    let column = Column::new(name.into(), millis);
    Ok(column.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
}

/// Extract a chrono axis from a datetime-, date- or string-typed column
pub fn timestamps_from_column(column: &Column) -> Result<Vec<NaiveDateTime>> {
    match column.dtype() {
        DataType::Datetime(time_unit, _) => {
            let time_unit = *time_unit;
            let physical = column.cast(&DataType::Int64)?;
            let ca = physical.as_materialized_series().i64()?;
            ca.into_iter()
                .map(|value| {
                    let value = value.ok_or_else(|| null_timestamp(column.name()))?;
                    datetime_from_physical(value, time_unit)
                })
                .collect()
        }
        DataType::Date => {
            let physical = column.cast(&DataType::Int32)?;
            let ca = physical.as_materialized_series().i32()?;
            ca.into_iter()
                .map(|value| {
                    let days = value.ok_or_else(|| null_timestamp(column.name()))?;
                    date_from_days(days)
                })
                .collect()
        }
        DataType::String => {
            let ca = column.as_materialized_series().str()?;
            ca.into_iter()
                .map(|value| {
                    let value = value.ok_or_else(|| null_timestamp(column.name()))?;
                    parse_timestamp(value)
                })
                .collect()
        }
        other => Err(TsFrameError::ShapeMismatch(format!(
            "column {} has non-temporal dtype {other}",
            column.name()
        ))),
    }
}

/// Find the table's own time index: the single datetime-typed column
///
/// Zero candidates or more than one is a shape error; callers that know the
/// timestamp column should name it explicitly instead.
pub fn detect_timestamp_column(df: &DataFrame) -> Result<String> {
    let mut candidates = df
        .get_columns()
        .iter()
        .filter(|c| matches!(c.dtype(), DataType::Datetime(_, _) | DataType::Date));
    match (candidates.next(), candidates.next()) {
        (Some(column), None) => Ok(column.name().to_string()),
        (None, _) => Err(TsFrameError::ShapeMismatch(
            "no datetime-typed column to use as a time index".to_string(),
        )),
        (Some(a), Some(b)) => Err(TsFrameError::ShapeMismatch(format!(
            "ambiguous time index: both {} and {} are datetime-typed",
            a.name(),
            b.name()
        ))),
    }
}

/// Parse one timestamp literal, covering datetime, date and year-month forms
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    for format in DATETIME_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(t);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d.and_hms_opt(0, 0, 0).unwrap());
    }
    // year-month form, e.g. "2021-03"
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d") {
        return Ok(d.and_hms_opt(0, 0, 0).unwrap());
    }
    Err(TsFrameError::DataError(format!(
        "unparseable timestamp {value:?}"
    )))
}

fn null_timestamp(column: &str) -> TsFrameError {
    TsFrameError::DataError(format!("null timestamp in column {column}"))
}

fn datetime_from_physical(value: i64, time_unit: TimeUnit) -> Result<NaiveDateTime> {
    let (secs, nanos) = match time_unit {
        TimeUnit::Nanoseconds => (
            value.div_euclid(1_000_000_000),
            value.rem_euclid(1_000_000_000),
        ),
        TimeUnit::Microseconds => (value.div_euclid(1_000_000), value.rem_euclid(1_000_000) * 1_000),
        TimeUnit::Milliseconds => (value.div_euclid(1_000), value.rem_euclid(1_000) * 1_000_000),
    };
    chrono::DateTime::from_timestamp(secs, nanos as u32)
        .map(|t| t.naive_utc())
        .ok_or_else(|| TsFrameError::DataError(format!("timestamp out of range: {value}")))
}

fn date_from_days(days: i32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .unwrap()
        .checked_add_signed(Duration::days(days as i64))
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap())
        .ok_or_else(|| TsFrameError::DataError(format!("date out of range: {days} days")))
}
