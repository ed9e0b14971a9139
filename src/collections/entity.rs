// ============================================================================
// collection-signals - Entity Identity
// Keyed lookup support for collection elements
// ============================================================================

// =============================================================================
// ENTITY ID
// =============================================================================

/// An element's identity under a named attribute.
///
/// Ids coming from external data are either strings or integers; both compare
/// and hash by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    Str(String),
    Num(i64),
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Str(s.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::Str(s)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Num(n)
    }
}

impl From<i32> for EntityId {
    fn from(n: i32) -> Self {
        EntityId::Num(n as i64)
    }
}

// =============================================================================
// KEYED
// =============================================================================

/// Elements that expose named identity attributes.
///
/// `field` is the attribute name the collection was configured with
/// (`"id"` by default). Returning `None` means the element has no value for
/// that attribute and never matches an id lookup.
pub trait Keyed {
    fn attribute(&self, field: &str) -> Option<EntityId>;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Feature {
        id: i64,
        name: String,
    }

    impl Keyed for Feature {
        fn attribute(&self, field: &str) -> Option<EntityId> {
            match field {
                "id" => Some(EntityId::Num(self.id)),
                "name" => Some(EntityId::Str(self.name.clone())),
                _ => None,
            }
        }
    }

    #[test]
    fn entity_id_equality() {
        assert_eq!(EntityId::from("abc"), EntityId::Str("abc".into()));
        assert_eq!(EntityId::from(7), EntityId::Num(7));
        assert_ne!(EntityId::from("7"), EntityId::from(7));
    }

    #[test]
    fn keyed_attribute_lookup() {
        let f = Feature {
            id: 3,
            name: "river".into(),
        };

        assert_eq!(f.attribute("id"), Some(EntityId::Num(3)));
        assert_eq!(f.attribute("name"), Some(EntityId::Str("river".into())));
        assert_eq!(f.attribute("missing"), None);
    }
}
