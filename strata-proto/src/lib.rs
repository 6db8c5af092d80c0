#![allow(clippy::all)]
//! Protocol buffer definitions of the Strata encoding tree.
//!
//! The Rust bindings are generated from `proto/encodings.proto` and checked in; regenerate them
//! with `cargo xtask generate-proto`.

#[rustfmt::skip]
#[path = "./generated/strata.encodings.rs"]
pub mod encodings;
