//! Helpers for tests that need a live OSRM instance.

pub mod osrm_dataset;
