//! Input records and their uniform tabular form.

mod rows;

pub use rows::{Record, RowSet};
