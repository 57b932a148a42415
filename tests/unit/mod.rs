//! Unit tests for individual components

mod audit_test;
mod builders_test;
mod config_test;
mod error_test;
mod output_path_test;
mod params_test;
mod util_test;
