//! Follower report builder for X data exports.
//!
//! A command-line tool that answers: "who are the accounts in my export,
//! and how big are they?" It reads the follower (or following) list from an
//! unpacked X data export, resolves every account through the X API with
//! caching and rate limit backoff, and writes one spreadsheet row per
//! account.

pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod export;
pub mod fetcher;
pub mod report;
pub mod x_api;
