//! Liveness probes
//!
//! A probe feeds a candidate list through one external classifier and streams
//! back the subset that qualifies. Two implementations exist:
//!
//! - [`DnsProbe`]: hosts that resolve (`dnsx`)
//! - [`HttpProbe`]: hosts that serve HTTP or HTTPS (`httpx`), reduced from URLs
//!
//! Probes never emit negatives. [`gather_verdicts`] turns a probe stream into
//! a full candidate-to-boolean map by treating every unmentioned candidate as
//! negative.

mod cli;
mod traits;

pub use cli::{DnsProbe, HttpProbe};
pub use traits::{Probe, ProbeFault, ProbeOutcome, gather_verdicts};
