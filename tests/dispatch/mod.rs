//! Dispatch module tests.

mod dispatcher_test;
mod stream_test;
mod work_test;
