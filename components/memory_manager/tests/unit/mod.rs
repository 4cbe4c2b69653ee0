//! Unit tests for memory_manager public API

mod test_table;
