//! Data sets supplied to the integrity checker
//!
//! A data set is passive input: tables of rows of scalar cells. Shape
//! problems (not tabular at all) are errors; content problems are left for
//! the checker to report.

mod cell;
mod dataset;
mod errors;
mod loader;

pub use cell::{Cell, KeyTuple, RowId};
pub use dataset::{row, DataSet, Row};
pub use errors::{DataError, DataResult};
pub use loader::DataLoader;
