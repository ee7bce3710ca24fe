//! Utility functions shared by the loading and rendering pipeline

pub mod logging;
