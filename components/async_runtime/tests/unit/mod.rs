//! Unit tests for the async runtime
