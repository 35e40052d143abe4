//! Property-based tests for merge and default resolution guarantees
