//! Feature engineering module
//!
//! This module provides:
//! - Stateless derived-feature computations (interactions, polynomials,
//!   domain flags)
//! - The fitted feature pipeline (one-hot encoding, neighborhood target
//!   encoding, frozen domain thresholds)

pub mod derive;
pub mod pipeline;

pub use derive::{
    domain_flags, interaction_features, polynomial_features, DomainFlags, DomainThresholds,
    InteractionFeatures, PolynomialFeatures,
};
pub use pipeline::{CategoricalEncoder, FeaturePipeline, NeighborhoodStats, PipelineError};
