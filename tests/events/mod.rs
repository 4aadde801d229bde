//! Event model tests.
