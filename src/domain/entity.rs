//! Domain Layer - Core Entity Trait
//!
//! Every record held in a synchronized list carries a stable identity.

use std::collections::HashSet;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Clone + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> &Self::Id;
}

/// Whether any entity in `entities` carries `id`
pub fn contains_id<T: Entity>(entities: &[T], id: &T::Id) -> bool {
    entities.iter().any(|entity| entity.id() == id)
}

/// Drop repeated identities, keeping the first occurrence and the input order.
///
/// Returns the number of entities removed.
pub fn dedupe_by_id<T: Entity>(entities: &mut Vec<T>) -> usize {
    let before = entities.len();
    let mut seen = HashSet::with_capacity(before);
    entities.retain(|entity| seen.insert(entity.id().clone()));
    before - entities.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        label: &'static str,
    }

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let mut rows = vec![
            Row { id: 1, label: "a" },
            Row { id: 2, label: "b" },
            Row { id: 1, label: "c" },
        ];
        assert_eq!(dedupe_by_id(&mut rows), 1);
        assert_eq!(rows.iter().map(|r| r.label).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_contains_id() {
        let rows = vec![Row { id: 7, label: "x" }];
        assert!(contains_id(&rows, &7));
        assert!(!contains_id(&rows, &8));
    }
}
