//! Hash-maps used by the dynamic structures.

/// Hashmap using [`hashbrown::HashMap`] with its default hasher.
pub type HashMap<K, V> = hashbrown::hash_map::HashMap<K, V>;

/// Insertion-ordered hashmap, used where iteration order must be deterministic.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V>;
