//! Statistical primitives for the statelens probing pipeline.
//!
//! This crate provides the label-level statistics the evaluation protocol is
//! built on:
//!
//! - **Categorical value counts**: Pooled occurrence counts per label value,
//!   with Shannon entropy and deterministic majority selection
//! - **Metric accumulation**: Collect per-run metric maps across repeated
//!   seeds and summarize them as mean and variance
//!
//! # Modules
//!
//! - [`categorical`]: Value counts, entropy, and majority computation
//! - [`aggregate`]: Cross-run metric accumulation and summary statistics
//!
//! # Examples
//!
//! ## Entropy of a pooled label distribution
//!
//! ```
//! use statelens_stats::categorical::ValueCounts;
//!
//! let mut counts = ValueCounts::new();
//! for _ in 0..50 {
//!     counts.record(0);
//!     counts.record(1);
//! }
//! // Balanced binary distribution: ln(2) nats
//! assert!((counts.entropy_nats() - 2.0_f64.ln()).abs() < 1e-12);
//! ```
//!
//! ## Aggregating metrics across runs
//!
//! ```
//! use statelens_stats::aggregate::MetricAccumulator;
//!
//! let mut acc = MetricAccumulator::new();
//! acc.record("test_a", 0.5);
//! acc.record("test_a", 0.7);
//! assert!((acc.mean("test_a").unwrap() - 0.6).abs() < 1e-12);
//! ```

pub mod aggregate;
pub mod categorical;
