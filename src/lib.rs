//! # twextender
//!
//! Extends spidered Twitter user archives back to a target date. A journal
//! directory records per user how far back the archive reaches, so downloads
//! can be resumed after a crash and shared between processes.

pub mod app;
pub mod cli;
pub mod config;
pub mod consts;
pub mod download;
pub mod error;
pub mod journal;
pub mod launcher;
mod output;
pub mod tweet;
pub mod utils;
