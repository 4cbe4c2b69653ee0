//! Unit tests for core_types public API

mod test_error;
