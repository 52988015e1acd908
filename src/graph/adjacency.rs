use std::{collections::BTreeSet, fmt};

use ahash::{AHashMap, AHashSet};
use serde::{de, ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

use crate::precinct::PrecinctId;

use super::GraphError;

/// Neighbor list for one precinct; most precincts have a handful of neighbors.
type Neighbors = SmallVec<[u32; 8]>;

/// Mapping from precinct id to its neighbor ids.
///
/// Keys keep their insertion order (the input collection order). Edges added through
/// [`AdjacencyMap::add_edge`] keep the relation symmetric, irreflexive and
/// duplicate-free. Maps decoded from disk keep their lists as written, so
/// [`AdjacencyMap::validate`] can report files that break those rules.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyMap {
    ids: Vec<PrecinctId>,
    index: AHashMap<PrecinctId, u32>, // Map between ids and contiguous indices.
    neighbors: Vec<Neighbors>,
}

/// A broken invariant found by [`AdjacencyMap::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// `a` lists `b` but `b` does not list `a`.
    Asymmetric { a: PrecinctId, b: PrecinctId },
    /// A precinct lists itself.
    SelfLoop { id: PrecinctId },
    /// `a` lists `b` more than once.
    Duplicate { a: PrecinctId, b: PrecinctId },
    /// An expected precinct has no key.
    Missing { id: PrecinctId },
    /// A key that is not among the expected precincts.
    Unexpected { id: PrecinctId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asymmetric { a, b } => write!(f, "{a} lists {b}, but {b} does not list {a}"),
            Self::SelfLoop { id } => write!(f, "{id} lists itself"),
            Self::Duplicate { a, b } => write!(f, "{a} lists {b} more than once"),
            Self::Missing { id } => write!(f, "{id} is missing from the map"),
            Self::Unexpected { id } => write!(f, "{id} is not in the input collection"),
        }
    }
}

impl AdjacencyMap {
    /// Create a map with one empty neighbor list per id.
    pub fn new(ids: impl IntoIterator<Item = PrecinctId>) -> Result<Self, GraphError> {
        let mut map = Self::default();
        for id in ids {
            map.push_id(id)?;
        }
        Ok(map)
    }

    /// Build a map from explicit `(id, neighbors)` lists, stored exactly as given.
    /// Every neighbor must itself be a key.
    pub fn from_lists(lists: Vec<(PrecinctId, Vec<PrecinctId>)>) -> Result<Self, GraphError> {
        let mut map = Self::new(lists.iter().map(|(id, _)| id.clone()))?;
        for (i, (_, neighbors)) in lists.into_iter().enumerate() {
            let resolved: Neighbors = neighbors.iter()
                .map(|neighbor| map.index_of(neighbor))
                .collect::<Result<_, _>>()?;
            map.neighbors[i] = resolved;
        }
        Ok(map)
    }

    /// Ids key a JSON object, so `17` and `"17"` count as the same id.
    fn push_id(&mut self, id: PrecinctId) -> Result<(), GraphError> {
        let twin = match &id {
            PrecinctId::Int(n) => PrecinctId::Str(n.to_string().into()),
            PrecinctId::Str(s) => PrecinctId::from_key(s),
        };
        if self.index.contains_key(&id) || self.index.contains_key(&twin) {
            return Err(GraphError::DuplicateIdentifier(id));
        }
        self.index.insert(id.clone(), self.ids.len() as u32);
        self.ids.push(id);
        self.neighbors.push(Neighbors::new());
        Ok(())
    }

    fn index_of(&self, id: &PrecinctId) -> Result<u32, GraphError> {
        self.index.get(id).copied().ok_or_else(|| GraphError::UnknownIdentifier(id.clone()))
    }

    /// The id written as `key` in a JSON object, whichever native type it has.
    pub fn find_key(&self, key: &str) -> Option<&PrecinctId> {
        [PrecinctId::from_key(key), PrecinctId::Str(key.into())].into_iter()
            .find_map(|id| self.index.get(&id).map(|&i| &self.ids[i as usize]))
    }

    /// Number of precincts (keys).
    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    /// Check if there are no precincts.
    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Precinct ids in key order.
    #[inline] pub fn ids(&self) -> &[PrecinctId] { &self.ids }

    /// Check whether `id` is a key.
    #[inline] pub fn contains(&self, id: &PrecinctId) -> bool { self.index.contains_key(id) }

    /// Neighbors of `id`, or `None` if `id` is not a key.
    pub fn neighbors(&self, id: &PrecinctId) -> Option<impl Iterator<Item = &PrecinctId> + '_> {
        let &i = self.index.get(id)?;
        Some(self.neighbors_at(i as usize))
    }

    fn neighbors_at(&self, i: usize) -> impl Iterator<Item = &PrecinctId> + '_ {
        self.neighbors[i].iter().map(|&j| &self.ids[j as usize])
    }

    /// Number of neighbors listed for `id`.
    pub fn degree(&self, id: &PrecinctId) -> Option<usize> {
        self.index.get(id).map(|&i| self.neighbors[i as usize].len())
    }

    /// Iterate over `(id, neighbors)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PrecinctId, impl Iterator<Item = &PrecinctId> + '_)> + '_ {
        self.ids.iter().enumerate().map(|(i, id)| (id, self.neighbors_at(i)))
    }

    /// Precincts with no neighbors.
    pub fn isolated(&self) -> impl Iterator<Item = &PrecinctId> + '_ {
        self.ids.iter().zip(&self.neighbors)
            .filter(|(_, neighbors)| neighbors.is_empty())
            .map(|(id, _)| id)
    }

    /// Check whether `b` is listed as a neighbor of `a`.
    pub fn is_adjacent(&self, a: &PrecinctId, b: &PrecinctId) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&i), Some(&j)) => self.neighbors[i as usize].contains(&j),
            _ => false,
        }
    }

    /// Number of undirected edges, assuming a symmetric relation.
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(|neighbors| neighbors.len()).sum::<usize>() / 2
    }

    /// Add the undirected edge `a`-`b`.
    /// Returns `false` if the edge already existed or `a == b`.
    pub fn add_edge(&mut self, a: &PrecinctId, b: &PrecinctId) -> Result<bool, GraphError> {
        let (i, j) = (self.index_of(a)?, self.index_of(b)?);
        Ok(self.link(i, j))
    }

    /// Add the undirected edge between two key indices, skipping self loops and repeats.
    pub(crate) fn link(&mut self, i: u32, j: u32) -> bool {
        if i == j || self.neighbors[i as usize].contains(&j) {
            return false;
        }
        self.neighbors[i as usize].push(j);
        self.neighbors[j as usize].push(i);
        true
    }

    /// The relation as a set of unordered pairs, each written smaller id first.
    /// Neighbor order and duplicates are erased, which makes maps comparable.
    pub fn edges(&self) -> BTreeSet<(PrecinctId, PrecinctId)> {
        self.ids.iter().enumerate()
            .flat_map(|(i, a)| self.neighbors_at(i).map(move |b| {
                if a <= b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) }
            }))
            .collect()
    }

    /// Check symmetry, irreflexivity and duplicate-freedom, and, when `expected` is
    /// given, that the key set equals it exactly.
    pub fn validate(&self, expected: Option<&[PrecinctId]>) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (i, neighbors) in self.neighbors.iter().enumerate() {
            let a = &self.ids[i];
            for (k, &j) in neighbors.iter().enumerate() {
                let b = &self.ids[j as usize];
                if j as usize == i {
                    violations.push(Violation::SelfLoop { id: a.clone() });
                } else if neighbors[..k].contains(&j) {
                    violations.push(Violation::Duplicate { a: a.clone(), b: b.clone() });
                } else if !self.neighbors[j as usize].contains(&(i as u32)) {
                    violations.push(Violation::Asymmetric { a: a.clone(), b: b.clone() });
                }
            }
        }

        // Keys compare by written form: an isolated numeric string id reads back as an integer.
        if let Some(expected) = expected {
            let keys: AHashSet<String> = self.ids.iter().map(ToString::to_string).collect();
            let wanted: AHashSet<String> = expected.iter().map(ToString::to_string).collect();
            violations.extend(expected.iter()
                .filter(|id| !keys.contains(&id.to_string()))
                .map(|id| Violation::Missing { id: id.clone() }));
            violations.extend(self.ids.iter()
                .filter(|id| !wanted.contains(&id.to_string()))
                .map(|id| Violation::Unexpected { id: id.clone() }));
        }

        violations
    }
}

/// Serializes as a JSON-style object: `{ id: [neighbor, ...], ... }`.
/// Integer ids become decimal keys; neighbor values keep their native type.
impl Serialize for AdjacencyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (i, id) in self.ids.iter().enumerate() {
            let neighbors: Vec<&PrecinctId> = self.neighbors_at(i).collect();
            map.serialize_entry(&id.to_string(), &neighbors)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AdjacencyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = AdjacencyMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping precinct ids to arrays of neighbor ids")
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut raw: Vec<(String, Vec<PrecinctId>)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry()? {
                    raw.push(entry);
                }

                // A numeric-looking key is a string id when some neighbor list quotes it.
                let quoted: Vec<bool> = {
                    let strings: AHashSet<&str> = raw.iter()
                        .flat_map(|(_, neighbors)| neighbors)
                        .filter_map(|id| match id { PrecinctId::Str(s) => Some(&**s), PrecinctId::Int(_) => None })
                        .collect();
                    raw.iter().map(|(key, _)| strings.contains(key.as_str())).collect()
                };

                let lists = raw.into_iter().zip(quoted)
                    .map(|((key, neighbors), quoted)| {
                        let id = if quoted { PrecinctId::Str(key.into()) } else { PrecinctId::from_key(&key) };
                        (id, neighbors)
                    })
                    .collect();
                AdjacencyMap::from_lists(lists).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_map(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(range: std::ops::Range<i64>) -> Vec<PrecinctId> {
        range.map(PrecinctId::Int).collect()
    }

    #[test]
    fn new_rejects_duplicate_ids() {
        let err = AdjacencyMap::new([PrecinctId::Int(1), PrecinctId::Int(1)]).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateIdentifier(PrecinctId::Int(1))));
    }

    #[test]
    fn new_rejects_ids_with_the_same_written_form() {
        let err = AdjacencyMap::new([PrecinctId::Int(17), PrecinctId::from("17")]).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateIdentifier(PrecinctId::Str(ref s)) if &**s == "17"));

        let err = AdjacencyMap::new([PrecinctId::from("-3"), PrecinctId::Int(-3)]).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateIdentifier(PrecinctId::Int(-3))));

        // "017" is written differently from 17.
        assert!(AdjacencyMap::new([PrecinctId::Int(17), PrecinctId::from("017")]).is_ok());
    }

    #[test]
    fn add_edge_is_symmetric_irreflexive_and_idempotent() {
        let mut map = AdjacencyMap::new(ids(0..3)).unwrap();
        let (a, b) = (PrecinctId::Int(0), PrecinctId::Int(1));

        assert!(map.add_edge(&a, &b).unwrap());
        assert!(!map.add_edge(&b, &a).unwrap());
        assert!(!map.add_edge(&a, &a).unwrap());

        assert!(map.is_adjacent(&a, &b) && map.is_adjacent(&b, &a));
        assert!(!map.is_adjacent(&a, &a));
        assert_eq!(map.degree(&a), Some(1));
        assert_eq!(map.edge_count(), 1);
        assert_eq!(map.isolated().cloned().collect::<Vec<_>>(), vec![PrecinctId::Int(2)]);
        assert!(map.validate(Some(ids(0..3).as_slice())).is_empty());
    }

    #[test]
    fn add_edge_rejects_unknown_ids() {
        let mut map = AdjacencyMap::new(ids(0..2)).unwrap();
        let err = map.add_edge(&PrecinctId::Int(0), &PrecinctId::Int(5)).unwrap_err();
        assert!(matches!(err, GraphError::UnknownIdentifier(PrecinctId::Int(5))));
    }

    #[test]
    fn edges_normalize_pair_order() {
        let mut map = AdjacencyMap::new(ids(0..3)).unwrap();
        map.add_edge(&PrecinctId::Int(2), &PrecinctId::Int(0)).unwrap();

        let edges: Vec<_> = map.edges().into_iter().collect();
        assert_eq!(edges, vec![(PrecinctId::Int(0), PrecinctId::Int(2))]);
    }

    #[test]
    fn validate_reports_each_violation_kind() {
        let (a, b, c) = (PrecinctId::Int(1), PrecinctId::Int(2), PrecinctId::Int(3));
        let map = AdjacencyMap::from_lists(vec![
            (a.clone(), vec![b.clone(), b.clone(), a.clone()]),
            (b.clone(), vec![a.clone()]),
            (c.clone(), vec![a.clone()]),
        ]).unwrap();

        let violations = map.validate(Some([a.clone(), b.clone(), PrecinctId::Int(4)].as_slice()));
        assert!(violations.contains(&Violation::Duplicate { a: a.clone(), b: b.clone() }));
        assert!(violations.contains(&Violation::SelfLoop { id: a.clone() }));
        assert!(violations.contains(&Violation::Asymmetric { a: c.clone(), b: a.clone() }));
        assert!(violations.contains(&Violation::Missing { id: PrecinctId::Int(4) }));
        assert!(violations.contains(&Violation::Unexpected { id: c.clone() }));
        assert_eq!(violations.len(), 5);
    }

    #[test]
    fn serializes_keys_as_strings_and_values_natively() {
        let mut map = AdjacencyMap::new([PrecinctId::Int(10), PrecinctId::from("0020"), PrecinctId::Int(30)]).unwrap();
        map.add_edge(&PrecinctId::Int(10), &PrecinctId::from("0020")).unwrap();

        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value, json!({ "10": ["0020"], "0020": [10], "30": [] }));
    }

    #[test]
    fn deserialize_rejects_unknown_neighbors() {
        let err = serde_json::from_value::<AdjacencyMap>(json!({ "1": [2] })).unwrap_err();
        assert!(err.to_string().contains("unknown precinct identifier 2"));
    }

    #[test]
    fn deserialize_restores_ids_and_relation() {
        let map: AdjacencyMap = serde_json::from_value(json!({ "1": [2], "2": [1], "007": [] })).unwrap();

        assert_eq!(map.len(), 3);
        assert!(map.is_adjacent(&PrecinctId::Int(1), &PrecinctId::Int(2)));
        assert_eq!(map.degree(&PrecinctId::from("007")), Some(0));
        assert!(map.validate(None).is_empty());
    }

    #[test]
    fn numeric_string_ids_survive_a_round_trip() {
        let (a, b) = (PrecinctId::from("17031"), PrecinctId::from("17043"));
        let mut map = AdjacencyMap::new([a.clone(), b.clone()]).unwrap();
        map.add_edge(&a, &b).unwrap();

        let back: AdjacencyMap = serde_json::from_slice(&serde_json::to_vec(&map).unwrap()).unwrap();
        assert_eq!(back.edges(), map.edges());
        assert_eq!(back.find_key("17031"), Some(&a));
    }

    #[test]
    fn validate_matches_expected_ids_by_written_form() {
        // An isolated "42" has nothing quoting it, so it reads back as an integer.
        let map: AdjacencyMap = serde_json::from_value(json!({ "42": [] })).unwrap();
        assert_eq!(map.find_key("42"), Some(&PrecinctId::Int(42)));
        assert!(map.validate(Some([PrecinctId::from("42")].as_slice())).is_empty());
        assert_eq!(map.find_key("43"), None);
    }
}
