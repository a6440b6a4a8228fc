//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  No RF hardware or real sensors are required;
//! filesystem tests run inside temporary directories.

mod app_service_tests;
mod mock_hw;
mod run_tests;
mod storage_tests;
