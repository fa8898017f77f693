//! Generation categories: which spatial picker a biome participates in.

use serde::{Deserialize, Serialize};

/// Coarse bucket selecting the picker a biome is sampled from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GenerationCategory {
    /// Nether-like dimension.
    Nether,
    /// Land areas of an End-like dimension (islands).
    EndLand,
    /// Void areas of an End-like dimension (between islands).
    EndVoid,
}

impl GenerationCategory {
    /// All categories, in picker order.
    pub const ALL: [Self; 3] = [Self::Nether, Self::EndLand, Self::EndVoid];

    /// Index into per-category arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Host classification of datapack biomes admitted into this category.
    pub fn host_category(self) -> HostCategory {
        match self {
            Self::Nether => HostCategory::Nether,
            Self::EndLand | Self::EndVoid => HostCategory::TheEnd,
        }
    }

    /// Human-readable name, used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Nether => "nether",
            Self::EndLand => "end_land",
            Self::EndVoid => "end_void",
        }
    }
}

/// Classification the host engine attaches to its own biome definitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostCategory {
    /// Overworld biomes (and anything not otherwise classified).
    Overworld,
    /// Nether biomes.
    Nether,
    /// End biomes.
    TheEnd,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_matches_picker_indices() {
        for (position, category) in GenerationCategory::ALL.into_iter().enumerate() {
            assert_eq!(category.index(), position, "{} out of order", category.name());
        }
        assert_eq!(GenerationCategory::Nether.host_category(), HostCategory::Nether);
        assert_eq!(GenerationCategory::EndVoid.host_category(), HostCategory::TheEnd);
    }
}
