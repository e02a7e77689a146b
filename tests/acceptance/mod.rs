//! Integration tests for ticker acceptance testing.

mod lifecycle_test;
mod period_test;
