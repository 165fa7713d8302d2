// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Logging macros for the waveform and sequence crates.
//!
//! Messages go through the `log` facade with target `awg.rust::<module>`.
//! [`diagnostic!`] messages (padding amounts, phase steps, idle counts) are
//! dropped unless the application enables them with
//! `init_logging(true)` before planning.

use std::sync::{atomic::AtomicBool, atomic::Ordering};

#[doc(hidden)]
pub use log as _log;

#[macro_export]
macro_rules! info {
    ($msg:literal, $($arg:tt)+) => {
        awg_log::_log::info!(target: concat!("awg.rust::", module_path!()), $msg, $($arg)+);
    };
    ($msg:literal) => {
        awg_log::_log::info!(target: concat!("awg.rust::", module_path!()), $msg);
    };
}

#[macro_export]
macro_rules! warn {
    ($msg:literal, $($arg:tt)+) => {
        awg_log::_log::warn!(target: concat!("awg.rust::", module_path!()), $msg, $($arg)+);
    };
    ($msg:literal) => {
        awg_log::_log::warn!(target: concat!("awg.rust::", module_path!()), $msg);
    };
}

/// Log a diagnostic message at info level if diagnostics logging is enabled.
///
/// Used for planning details (phase steps, padding amounts) that are useful
/// when bringing up a new waveform but too noisy for regular operation.
#[macro_export]
macro_rules! diagnostic {
    ($msg:literal, $($arg:tt)+) => {
        if awg_log::is_diagnostics_enabled() {
             awg_log::_log::info!(target: concat!("awg.rust::", module_path!()), $msg, $($arg)+);
        }
    };
    ($msg:literal) => {
        if awg_log::is_diagnostics_enabled() {
            awg_log::_log::info!(target: concat!("awg.rust::", module_path!()), $msg);
        }
    };
}

static DIAGNOSTICS_ENABLED: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS_ENABLED.load(Ordering::Acquire)
}

/// Initialize the logging.
///
/// This function is meant to be called once at the start of the program.
/// No concrete logger is installed here; the embedding application chooses
/// the `log` backend. Only the diagnostics switch is set.
pub fn init_logging(with_diagnostics: bool) {
    DIAGNOSTICS_ENABLED.store(with_diagnostics, Ordering::Release);
}
