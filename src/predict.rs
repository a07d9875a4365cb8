//! Prediction-time truncation of observed horizons

use ndarray::{Array2, ArrayD, Axis, Slice};

use crate::error::{Result, TsFrameError};
use crate::record::DataRecord;

/// Drop the last `ignore_last_n_targets` observed steps from a record
///
/// Truncates `target` and `past_feat_dynamic_real` along their trailing
/// (time) axis, whatever the rank; `feat_dynamic_real` extends beyond the
/// observed horizon and is left untouched, as are `start`, static features
/// and `item_id`. Returns a new record; the input is never mutated.
/// Requesting more steps than are observed is a hard failure.
pub fn prepare_prediction_data(
    record: &DataRecord,
    ignore_last_n_targets: usize,
) -> Result<DataRecord> {
    let target = truncate_trailing(&record.target, ignore_last_n_targets)?;
    let past_feat_dynamic_real = match &record.past_feat_dynamic_real {
        Some(array) => Some(truncate_rows(array, ignore_last_n_targets)?),
        None => None,
    };
    Ok(DataRecord {
        start: record.start,
        target,
        feat_dynamic_real: record.feat_dynamic_real.clone(),
        past_feat_dynamic_real,
        feat_static_cat: record.feat_static_cat.clone(),
        feat_static_real: record.feat_static_real.clone(),
        item_id: record.item_id.clone(),
    })
}

fn truncate_trailing(array: &ArrayD<f64>, n: usize) -> Result<ArrayD<f64>> {
    if array.ndim() == 0 {
        return Err(TsFrameError::ShapeMismatch(
            "target must have a time axis".to_string(),
        ));
    }
    let axis = Axis(array.ndim() - 1);
    let available = array.len_of(axis);
    if n > available {
        return Err(TsFrameError::TruncationOverflow {
            requested: n,
            available,
        });
    }
    let keep = (available - n) as isize;
    Ok(array.slice_axis(axis, Slice::from(..keep)).to_owned())
}

fn truncate_rows(array: &Array2<f64>, n: usize) -> Result<Array2<f64>> {
    let available = array.ncols();
    if n > available {
        return Err(TsFrameError::TruncationOverflow {
            requested: n,
            available,
        });
    }
    let keep = (available - n) as isize;
    Ok(array.slice_axis(Axis(1), Slice::from(..keep)).to_owned())
}
