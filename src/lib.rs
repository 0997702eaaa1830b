//! # SpaceSweep
//!
//! A scan and safe-cleanup engine for reclaimable disk space.
//!
//! SpaceSweep measures well-known sources of disposable data and removes
//! them on request. It features:
//!
//! - **Two Scan Tiers**: aggregate-only totals, or capped item lists with paths
//! - **Safety-First**: every path is classified before it is listed or deleted
//! - **Cancellable Scans**: phase-by-phase progress with cooperative cancellation
//! - **Dry Runs**: the cleanup path can be rehearsed without touching the disk
//! - **Embeddable**: a Rust [`api::Engine`] and a C ABI in [`ffi`]

pub mod api;
pub mod cleaner;
pub mod cli;
pub mod common;
pub mod ffi;
pub mod scanner;
