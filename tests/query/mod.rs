//! Query module tests.

mod files_test;
mod runner_test;
