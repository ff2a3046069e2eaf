//! Dataset sources used outside a live host

pub mod csv_source;
pub mod sample;

pub use csv_source::{load_csv, load_csv_path};
pub use sample::{dispatch_sample, SampleSpec};
