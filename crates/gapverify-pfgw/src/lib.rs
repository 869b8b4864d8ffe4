//! PRP tool abstraction for prime-gap-verify.
//!
//! This crate defines the [`PrpTool`] trait, the single interface through
//! which the primality oracle talks to an external probable-prime tester. The
//! oracle never spawns processes itself; it depends on `gapverify-pfgw` and
//! programs against the trait.
//!
//! # Crate layout
//!
//! - [`tool`]: the [`PrpTool`] trait definition.
//! - [`types`]: value types used in trait signatures ([`ToolOutput`],
//!   [`PrpVerdict`], [`Probe`]).
//! - [`verdict`]: [`parse_verdict`], the only code coupled to the tool's
//!   free-text output format.
//! - [`error`]: the [`ToolError`] enum returned by all trait methods.

pub mod error;
pub mod tool;
pub mod types;
pub mod verdict;

// subprocess-backed implementation
mod pfgw;

pub use pfgw::Pfgw;

pub use error::ToolError;
pub use tool::{PrpTool, self_check};
pub use types::{Probe, PrpVerdict, ToolOutput, default_probes};
pub use verdict::{DEFAULT_MARKER, parse_verdict};
