//! # Lamella Core
//!
//! The numerical backbone of the Lamella framework: the characteristic
//! (transfer) matrix engine for stratified thin-film stacks, and the sweep
//! machinery that drives it across wavelength and angle grids.
//!
//! ## Architecture
//!
//! Solvers implement the [`solver::StackSolver`] trait, which maps one
//! (wavelength, angle, polarization) triple to complex amplitude reflection
//! and transmission coefficients. The implementation is the Abelès
//! characteristic-matrix method ([`solver::TransferMatrixSolver`]).
//!
//! ## Modules
//!
//! - [`types`] - Stack model, sweep ranges, display options, errors.
//! - [`solver`] - Solver trait and the transfer-matrix implementation.
//! - [`sweep`] - Spectral and angular sweeps (parallel, cancellable).
//! - [`aggregate`] - Summary scalars, depth profile, export tables.
//! - [`qwot`] - Quarter-wave optical thickness stack builder.
//! - [`history`] - Opaque configuration snapshots and the undo ring buffer.

pub mod aggregate;
pub mod history;
pub mod qwot;
pub mod solver;
pub mod sweep;
pub mod types;
