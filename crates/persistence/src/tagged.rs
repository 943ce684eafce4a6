//! Tagged collection encoding.
//!
//! Maps are written as `{"_type": "map", "map": [[key, value], ...]}` and sets
//! as `{"_type": "set", "set": [value, ...]}`. Entry order carries no meaning;
//! both decode into ordered collections.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

const MAP_TAG: &str = "map";
const SET_TAG: &str = "set";

#[derive(Deserialize)]
struct RawMap<K, V> {
    #[serde(rename = "_type")]
    kind: String,
    map: Vec<(K, V)>,
}

#[derive(Deserialize)]
struct RawSet<T> {
    #[serde(rename = "_type")]
    kind: String,
    set: Vec<T>,
}

/// A map in its tagged document form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedMap<K: Ord, V>(pub BTreeMap<K, V>);

impl<K: Ord, V> Default for TaggedMap<K, V> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for TaggedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<K: Ord, V> IntoIterator for TaggedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::collections::btree_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K, V> Serialize for TaggedMap<K, V>
where
    K: Ord + Serialize,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Out<'a, K, V> {
            #[serde(rename = "_type")]
            kind: &'static str,
            map: Vec<(&'a K, &'a V)>,
        }
        Out {
            kind: MAP_TAG,
            map: self.0.iter().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, K, V> Deserialize<'de> for TaggedMap<K, V>
where
    K: Ord + DeserializeOwned,
    V: DeserializeOwned,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawMap::<K, V>::deserialize(deserializer)?;
        if raw.kind != MAP_TAG {
            return Err(D::Error::custom(format!(
                "expected a tagged map, found _type \"{}\"",
                raw.kind
            )));
        }
        Ok(raw.map.into_iter().collect())
    }
}

/// A set in its tagged document form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedSet<T: Ord>(pub BTreeSet<T>);

impl<T: Ord> Default for TaggedSet<T> {
    fn default() -> Self {
        Self(BTreeSet::new())
    }
}

impl<T: Ord + Serialize> Serialize for TaggedSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Out<'a, T> {
            #[serde(rename = "_type")]
            kind: &'static str,
            set: Vec<&'a T>,
        }
        Out {
            kind: SET_TAG,
            set: self.0.iter().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, T: Ord + DeserializeOwned> Deserialize<'de> for TaggedSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawSet::<T>::deserialize(deserializer)?;
        if raw.kind != SET_TAG {
            return Err(D::Error::custom(format!(
                "expected a tagged set, found _type \"{}\"",
                raw.kind
            )));
        }
        Ok(Self(raw.set.into_iter().collect()))
    }
}
