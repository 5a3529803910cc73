use ndarray::{Array1, ArrayView1};
use serde::{Serialize, Deserialize};
use std::hash::{Hash, Hasher};

/// A feature vector usable as a map key.
///
/// Two keys are equal when their elements are equal one by one. Hashing and
/// equality both go through a canonical bit pattern (`-0.0` folded onto `0.0`,
/// every NaN folded onto one NaN) so `Eq` and `Hash` agree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalKey(Vec<f32>);

fn canonical_bits(value: f32) -> u32 {
    if value == 0.0 {
        0
    } else if value.is_nan() {
        f32::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

impl GoalKey {
    pub fn new(features: ArrayView1<f32>) -> Self {
        GoalKey(features.iter().copied().collect())
    }

    pub fn view(&self) -> ArrayView1<'_, f32> {
        ArrayView1::from(&self.0[..])
    }

    pub fn to_array(&self) -> Array1<f32> {
        Array1::from(self.0.clone())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element-wise comparison against a raw feature vector.
    pub fn matches(&self, features: ArrayView1<f32>) -> bool {
        self.0.len() == features.len()
            && self
                .0
                .iter()
                .zip(features.iter())
                .all(|(&a, &b)| canonical_bits(a) == canonical_bits(b))
    }
}

impl From<Array1<f32>> for GoalKey {
    fn from(features: Array1<f32>) -> Self {
        GoalKey(features.to_vec())
    }
}

impl PartialEq for GoalKey {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.view())
    }
}

impl Eq for GoalKey {}

impl Hash for GoalKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for &value in &self.0 {
            canonical_bits(value).hash(state);
        }
    }
}
