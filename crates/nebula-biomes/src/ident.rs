//! Namespaced identifiers (`namespace:path`) and the typed wrappers built on them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Namespace assumed when an identifier is written without one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A stable `namespace:path` identity.
///
/// Cheap to clone (the string is shared) and ordered lexically so it can key
/// `BTreeMap`s with reproducible iteration order.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct Identifier {
    full: Arc<str>,
    split: usize,
}

impl Identifier {
    /// Builds an identifier from its two halves.
    pub fn new(namespace: &str, path: &str) -> Self {
        let full: Arc<str> = format!("{namespace}:{path}").into();
        Self {
            full,
            split: namespace.len(),
        }
    }

    /// Parses `namespace:path`; a missing namespace defaults to [`DEFAULT_NAMESPACE`].
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, raw),
        }
    }

    /// The part before the colon.
    pub fn namespace(&self) -> &str {
        &self.full[..self.split]
    }

    /// The part after the colon.
    pub fn path(&self) -> &str {
        &self.full[self.split + 1..]
    }

    /// The full `namespace:path` string.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Dotted form (`namespace.path`) used as a configuration group key.
    pub fn config_key(&self) -> String {
        format!("{}.{}", self.namespace(), self.path())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.full)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl From<&str> for Identifier {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for Identifier {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.full.to_string()
    }
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Identifier);

        impl $name {
            /// Parses `namespace:path` (namespace defaults to `minecraft`).
            pub fn parse(raw: &str) -> Self {
                Self(Identifier::parse(raw))
            }

            /// The underlying identifier.
            pub fn ident(&self) -> &Identifier {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::parse(raw)
            }
        }
    };
}

typed_id!(
    /// Identity of a biome.
    BiomeId
);
typed_id!(
    /// Identity of a placed feature.
    FeatureId
);
typed_id!(
    /// Identity of a configured carver.
    CarverId
);
typed_id!(
    /// Identity of a configured structure instance.
    StructureId
);
typed_id!(
    /// Identity of a structure type (the family a configured structure belongs to).
    StructureTypeId
);
typed_id!(
    /// Identity of an entity type used in spawn tables.
    EntityTypeId
);
typed_id!(
    /// Identity of a dimension (`minecraft:the_nether`, ...).
    DimensionId
);
typed_id!(
    /// Identity of a surface rule supplied by the host.
    SurfaceRuleId
);
typed_id!(
    /// Identity of a generator-settings object.
    SettingsId
);

impl DimensionId {
    /// `minecraft:overworld`.
    pub fn overworld() -> Self {
        Self::parse("minecraft:overworld")
    }

    /// `minecraft:the_nether`.
    pub fn nether() -> Self {
        Self::parse("minecraft:the_nether")
    }

    /// `minecraft:the_end`.
    pub fn end() -> Self {
        Self::parse("minecraft:the_end")
    }

    /// Generator settings the dimension generates with.
    ///
    /// Vanilla dimensions map to their vanilla settings; any other dimension
    /// uses settings named after itself.
    pub fn settings_id(&self) -> SettingsId {
        match self.0.as_str() {
            "minecraft:the_nether" => SettingsId::parse("minecraft:nether"),
            "minecraft:the_end" => SettingsId::parse("minecraft:end"),
            _ => SettingsId(self.0.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_namespace() {
        let id = Identifier::parse("betternether:gravel_desert");
        assert_eq!(id.namespace(), "betternether");
        assert_eq!(id.path(), "gravel_desert");
        assert_eq!(id.as_str(), "betternether:gravel_desert");
    }

    #[test]
    fn test_parse_defaults_namespace() {
        let id = Identifier::parse("nether_wastes");
        assert_eq!(id.namespace(), "minecraft");
        assert_eq!(id.to_string(), "minecraft:nether_wastes");
    }

    #[test]
    fn test_config_key_is_dotted() {
        let id = BiomeId::parse("mod:crystal_caves");
        assert_eq!(id.ident().config_key(), "mod.crystal_caves");
    }

    #[test]
    fn test_ordering_is_lexical() {
        let mut ids = vec![
            BiomeId::parse("b:x"),
            BiomeId::parse("a:z"),
            BiomeId::parse("a:y"),
        ];
        ids.sort();
        let names: Vec<_> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["a:y", "a:z", "b:x"]);
    }

    #[test]
    fn test_dimension_settings_ids() {
        assert_eq!(DimensionId::nether().settings_id(), SettingsId::parse("nether"));
        assert_eq!(DimensionId::end().settings_id(), SettingsId::parse("end"));
        assert_eq!(
            DimensionId::parse("mod:aether").settings_id(),
            SettingsId::parse("mod:aether")
        );
    }
}
