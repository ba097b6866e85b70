//! Testing utilities for collector runs.
//!
//! This module provides scripted stand-ins for the two network seams:
//! - [`ScriptedSearchBackend`] answers pages from canned hit lists
//! - [`ScriptedFetcher`] answers URLs from canned resources or failures

mod fakes;

pub use fakes::{ScriptedFetcher, ScriptedSearchBackend};
