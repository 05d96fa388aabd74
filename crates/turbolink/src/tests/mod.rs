//! Test suites for the link engine.

mod support;
mod unit;
