//! Annotation results produced by successful validations.
//!
//! The `unevaluatedProperties` and `unevaluatedItems` keywords need to know
//! which members of a value were already "seen" by other keywords. Validators
//! report that information as an [`Evaluation`] returned alongside success;
//! composite validators merge their children's evaluations according to the
//! rules of each composition keyword.
use ahash::AHashSet;

/// Annotations gathered while validating a single value.
///
/// Merging is a field-wise union: it is commutative and idempotent, so the
/// order in which sibling results are combined does not matter.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Evaluation {
    /// No annotations were produced.
    #[default]
    None,
    /// Property names of an object that were evaluated.
    Object(ObjectEvaluation),
    /// Indices of an array that were evaluated.
    Array(ArrayEvaluation),
}

impl Evaluation {
    /// Whether no members were marked as evaluated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Evaluation::None => true,
            Evaluation::Object(object) => object.properties.is_empty(),
            Evaluation::Array(array) => array.items.is_empty(),
        }
    }

    /// The evaluated property names, if this is an object result.
    pub fn evaluated_properties(&self) -> Option<impl Iterator<Item = &str>> {
        match self {
            Evaluation::Object(object) => Some(object.properties.iter().map(String::as_str)),
            _ => None,
        }
    }

    /// The evaluated item indices, if this is an array result.
    pub fn evaluated_items(&self) -> Option<impl Iterator<Item = usize> + '_> {
        match self {
            Evaluation::Array(array) => Some(array.items.iter()),
            _ => None,
        }
    }

    /// Whether the given property was marked as evaluated.
    #[must_use]
    pub fn is_property_evaluated(&self, key: &str) -> bool {
        matches!(self, Evaluation::Object(object) if object.properties.contains(key))
    }

    /// Whether the given index was marked as evaluated.
    #[must_use]
    pub fn is_item_evaluated(&self, index: usize) -> bool {
        matches!(self, Evaluation::Array(array) if array.items.contains(index))
    }

    /// Record a property as evaluated. Turns a `None` result into an
    /// object result.
    pub fn mark_property(&mut self, key: &str) {
        match self {
            Evaluation::Object(object) => {
                object.properties.insert(key.to_string());
            }
            Evaluation::None => {
                let mut properties = AHashSet::new();
                properties.insert(key.to_string());
                *self = Evaluation::Object(ObjectEvaluation { properties });
            }
            Evaluation::Array(_) => {}
        }
    }

    /// Record an array index as evaluated. Turns a `None` result into an
    /// array result.
    pub fn mark_item(&mut self, index: usize) {
        match self {
            Evaluation::Array(array) => array.items.insert(index),
            Evaluation::None => {
                let mut items = IndexBitSet::default();
                items.insert(index);
                *self = Evaluation::Array(ArrayEvaluation { items });
            }
            Evaluation::Object(_) => {}
        }
    }

    /// Union `other` into `self`. Results of different shapes cannot arise
    /// for a single instance; should they meet, `self` wins.
    pub(crate) fn merge(&mut self, other: Evaluation) {
        if matches!(other, Evaluation::None) {
            return;
        }
        match self {
            Evaluation::None => *self = other,
            Evaluation::Object(into) => {
                if let Evaluation::Object(from) = other {
                    into.properties.extend(from.properties);
                }
            }
            Evaluation::Array(into) => {
                if let Evaluation::Array(from) = other {
                    into.items.union(&from.items);
                }
            }
        }
    }
}

/// Evaluated property names of an object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectEvaluation {
    properties: AHashSet<String>,
}

/// Evaluated indices of an array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayEvaluation {
    items: IndexBitSet,
}

/// A growable bitset keyed by array index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexBitSet {
    blocks: Vec<u64>,
}

const BLOCK_BITS: usize = 64;

impl IndexBitSet {
    pub(crate) fn insert(&mut self, index: usize) {
        let block = index / BLOCK_BITS;
        if block >= self.blocks.len() {
            self.blocks.resize(block + 1, 0);
        }
        self.blocks[block] |= 1 << (index % BLOCK_BITS);
    }

    /// Whether the given index is present.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.blocks
            .get(index / BLOCK_BITS)
            .is_some_and(|block| block & (1 << (index % BLOCK_BITS)) != 0)
    }

    /// Whether the set has no indices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|block| *block == 0)
    }

    pub(crate) fn union(&mut self, other: &IndexBitSet) {
        if other.blocks.len() > self.blocks.len() {
            self.blocks.resize(other.blocks.len(), 0);
        }
        for (into, from) in self.blocks.iter_mut().zip(&other.blocks) {
            *into |= from;
        }
    }

    /// Iterate over the contained indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().enumerate().flat_map(|(block, bits)| {
            (0..BLOCK_BITS)
                .filter(move |bit| bits & (1 << bit) != 0)
                .map(move |bit| block * BLOCK_BITS + bit)
        })
    }
}
