//! Error taxonomy for biome registration and resolution.

use crate::ident::BiomeId;

/// Errors raised while registering or resolving biomes.
///
/// Registration errors are recoverable: the offending entry is skipped and
/// generation continues. [`BiomeError::NoBiomesAvailable`] is fatal for the
/// dimension being generated and must reach the host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BiomeError {
    /// Generation weight was zero, negative, or not finite.
    #[error("invalid generation weight {weight} for biome {id}")]
    InvalidWeight {
        /// Biome that was rejected.
        id: BiomeId,
        /// The offending weight.
        weight: f64,
    },

    /// Sub-biome replacement probability outside `(0, 1]`.
    #[error("invalid replacement chance {chance} for sub-biome {id}")]
    InvalidChance {
        /// Sub-biome that was rejected.
        id: BiomeId,
        /// The offending probability.
        chance: f64,
    },

    /// A sub-biome was attached to a parent that was never registered.
    #[error("cannot attach {child} to unregistered parent {parent}")]
    UnknownParent {
        /// The missing parent.
        parent: BiomeId,
        /// The sub-biome that could not be attached.
        child: BiomeId,
    },

    /// A picker with zero cumulative weight was asked to pick.
    #[error("no biomes available for sampling")]
    NoBiomesAvailable,

    /// Lookup of an identity that was never registered.
    #[error("unknown biome identity: {0}")]
    UnknownBiomeIdentity(BiomeId),

    /// A picker was sampled after its partitions changed without a rebuild.
    #[error("picker sampled before rebuild (revision {current}, built at {built})")]
    StaleSamplingStructure {
        /// Revision of the partitions.
        current: u64,
        /// Revision the search structure was built from.
        built: u64,
    },
}
