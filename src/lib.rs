//! dxtscan - conflict detection for Darshan DXT parallel I/O traces
//!
//! This library reads per-call DXT trace text, groups the calls by file, and
//! sweeps each file for pairs of accesses from different ranks that touch the
//! same bytes with at least one write. It also reports writes that share a
//! storage block without sharing bytes, and same-rank overlaps that don't look
//! like one MPI-IO call and the POSIX calls beneath it.

pub mod cli;
pub mod config;
pub mod conflict;
pub mod csv_output;
pub mod event;
pub mod file_table;
pub mod ingest;
pub mod json_output;
pub mod summary;
pub mod text_output;
