//! Shared integer math for the tidepool workspace.
//!
//! All rate and conversion arithmetic in the system runs through the helpers
//! in this crate so that rounding direction is decided in exactly one place.
//! The crate is `no_std` and dependency-free so it can be used from the pure
//! model crates and checked with Kani.

#![no_std]
#![forbid(unsafe_code)]

#[cfg(kani)]
extern crate kani;

pub mod math;

pub use math::{add_signed, mul_add_div_floor, mul_div_ceil, mul_div_floor, MathError, ONE};
