//! tsframe - tabular time series adapter for forecasting pipelines
//!
//! Converts heterogeneous tabular time-series representations into a
//! uniform stream of canonical per-entity records:
//! - a single labeled sequence, collections of sequences, or mappings of
//!   sequences,
//! - per-entity frames, collections of frames, or mappings of frames,
//! - one long-format table holding many interleaved series, split by an
//!   identifier column.
//!
//! # Modules
//!
//! - [`input`] - supported input shapes and sequence-to-table normalization
//! - [`period`] - frequencies, periods and the uniform-spacing predicate
//! - [`config`] - column-role configuration
//! - [`record`] - canonical records and the per-entity record builder
//! - [`dataset`] - the iterable dataset container and long-table splitter
//! - [`predict`] - prediction-time truncation of observed horizons
//! - [`error`] - error types

pub mod config;
pub mod dataset;
pub mod error;
pub mod input;
pub mod period;
pub mod predict;
pub mod record;

pub use config::DatasetConfig;
pub use dataset::TimeSeriesDataset;
pub use error::{Result, TsFrameError};
pub use input::{DataInput, TimeSeries};
pub use period::{is_uniform, FreqUnit, Frequency, Period};
pub use predict::prepare_prediction_data;
pub use record::{as_data_record, DataRecord};
