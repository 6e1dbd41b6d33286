//! # mutation-gate
//!
//! `mutation-gate` fails a build when its mutation score regresses. One cycle:
//! - reads the stored baseline (or a zero default on first run),
//! - runs the mutation tests with the console attached,
//! - collects a fresh result set from the engine,
//! - compares scores and reports the details,
//! - stores the fresh result set as the next baseline.
//!
//! The `gate` module holds the cycle and its collaborators; the `cli`
//! feature adds the `mutation-gate` binary.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod gate;
#[cfg(feature = "cli")]
#[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
pub mod logging;
pub mod prelude;
