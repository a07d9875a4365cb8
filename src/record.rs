//! Canonical per-entity records and the record builder
//!
//! One [`DataRecord`] is the unit consumed by a downstream forecasting
//! pipeline: a start period, the observed target array and any declared
//! covariate arrays. [`as_data_record`] builds a record from one entity's
//! table, enforcing the uniform-index and constant-static invariants.

use ndarray::{Array1, Array2, ArrayD};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::DatasetConfig;
use crate::error::{Result, TsFrameError};
use crate::input::{detect_timestamp_column, timestamps_from_column};
use crate::period::{is_uniform, Frequency, Period};

/// The canonical per-entity record
///
/// `target` keeps time on the trailing axis at any rank; the builder
/// produces one-dimensional targets, higher ranks arise from co-indexed
/// batches assembled by consumers. Optional fields are populated only when
/// the corresponding columns were declared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRecord {
    /// First observation's time slot at the dataset frequency
    pub start: Period,
    /// Observed value sequence; the trailing axis is time
    pub target: ArrayD<f64>,
    /// One row per dynamic real covariate, may extend beyond the horizon
    pub feat_dynamic_real: Option<Array2<f64>>,
    /// One row per dynamic real covariate observed only up to the horizon
    pub past_feat_dynamic_real: Option<Array2<f64>>,
    /// One code per static categorical covariate
    pub feat_static_cat: Option<Array1<i64>>,
    /// One value per static real covariate
    pub feat_static_real: Option<Array1<f64>>,
    /// Entity identifier, present only for keyed sources
    pub item_id: Option<String>,
}

impl DataRecord {
    /// Number of observed time steps, the length of the trailing axis
    pub fn target_len(&self) -> usize {
        self.target.shape().last().copied().unwrap_or(0)
    }
}

/// Build one canonical record from one entity's table
///
/// The table must already be sliced to a single entity and sorted by time;
/// a non-uniform index at the given frequency is a hard failure.
pub fn as_data_record(
    df: &DataFrame,
    config: &DatasetConfig,
    freq: Frequency,
    item_id: Option<&str>,
) -> Result<DataRecord> {
    build_record(df, config, freq, item_id, item_id.unwrap_or("<series>"))
}

// `label` names the entity in failure messages; iteration passes a
// positional label for unkeyed entries.
pub(crate) fn build_record(
    df: &DataFrame,
    config: &DatasetConfig,
    freq: Frequency,
    item_id: Option<&str>,
    label: &str,
) -> Result<DataRecord> {
    if df.height() == 0 {
        return Err(TsFrameError::ShapeMismatch(format!(
            "entity {label} has no rows"
        )));
    }

    let timestamp_column = match &config.timestamp {
        Some(name) => name.clone(),
        None => detect_timestamp_column(df)?,
    };
    let timestamps = timestamps_from_column(named_column(df, &timestamp_column)?)?;
    let index: Vec<Period> = timestamps.iter().map(|t| Period::new(*t, freq)).collect();
    if !is_uniform(&index) {
        return Err(TsFrameError::NonUniformTimeIndex {
            item: label.to_string(),
            reason: format!("timestamps are not evenly spaced at frequency {freq}"),
        });
    }

    let height = df.height();
    let target = Array1::from_vec(numeric_values(df, &config.target, height)?).into_dyn();

    Ok(DataRecord {
        start: index[0],
        target,
        feat_dynamic_real: dynamic_features(df, &config.feat_dynamic_real, height)?,
        past_feat_dynamic_real: dynamic_features(df, &config.past_feat_dynamic_real, height)?,
        feat_static_cat: static_cat_features(df, &config.feat_static_cat, label)?,
        feat_static_real: static_real_features(df, &config.feat_static_real, label)?,
        item_id: item_id.map(|s| s.to_string()),
    })
}

fn named_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| TsFrameError::ColumnNotFound(name.to_string()))
}

// Nulls become NaN so gaps in covariates survive into the arrays instead of
// shifting positions.
fn numeric_values(df: &DataFrame, name: &str, expected: usize) -> Result<Vec<f64>> {
    let series = named_column(df, name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let values: Vec<f64> = series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    if values.len() != expected {
        return Err(TsFrameError::FeatureLengthMismatch {
            column: name.to_string(),
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}

fn dynamic_features(
    df: &DataFrame,
    columns: &[String],
    len: usize,
) -> Result<Option<Array2<f64>>> {
    if columns.is_empty() {
        return Ok(None);
    }
    let mut flat = Vec::with_capacity(columns.len() * len);
    for name in columns {
        flat.extend(numeric_values(df, name, len)?);
    }
    Ok(Some(Array2::from_shape_vec((columns.len(), len), flat)?))
}

fn static_cat_features(
    df: &DataFrame,
    columns: &[String],
    label: &str,
) -> Result<Option<Array1<i64>>> {
    if columns.is_empty() {
        return Ok(None);
    }
    let mut codes = Vec::with_capacity(columns.len());
    for name in columns {
        let series = constant_series(df, name, label)?;
        let cast = series.cast(&DataType::Int64)?;
        let code = cast.i64()?.get(0).ok_or_else(|| {
            TsFrameError::DataError(format!("static column {name} has no categorical code"))
        })?;
        codes.push(code);
    }
    Ok(Some(Array1::from_vec(codes)))
}

fn static_real_features(
    df: &DataFrame,
    columns: &[String],
    label: &str,
) -> Result<Option<Array1<f64>>> {
    if columns.is_empty() {
        return Ok(None);
    }
    let mut values = Vec::with_capacity(columns.len());
    for name in columns {
        let series = constant_series(df, name, label)?;
        let cast = series.cast(&DataType::Float64)?;
        let value = cast.f64()?.get(0).ok_or_else(|| {
            TsFrameError::DataError(format!("static column {name} has no value"))
        })?;
        values.push(value);
    }
    Ok(Some(Array1::from_vec(values)))
}

// A declared static column must hold one distinct value across the entity's
// rows; nulls count as a value of their own.
fn constant_series(df: &DataFrame, name: &str, label: &str) -> Result<Series> {
    let series = named_column(df, name)?.as_materialized_series().clone();
    if series.n_unique()? != 1 {
        return Err(TsFrameError::InconsistentStaticFeature {
            column: name.to_string(),
            item: label.to_string(),
        });
    }
    Ok(series)
}
