//! # N2K Bridge Library
//!
//! Aggregate engine, tank and temperature readings into the periodic NMEA 2000
//! messages a chart plotter expects.
//!
//! Readings arrive asynchronously and are held in expiring fields. Each
//! encoder transmits on the cadence the protocol mandates whether or not new
//! data arrived, sending "not available" for anything that went stale.

pub mod bridge;
pub mod clock;
pub mod config;
pub mod encoders;
pub mod error;
pub mod flow;
pub mod input;
pub mod n2k;
pub mod runner;
pub mod transport;
