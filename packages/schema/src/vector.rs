//! Ordered field-name → value mapping fed to the classifier.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Fixed-schema numeric encoding of road conditions.
///
/// Field order is significant: it is the column order the classifier was
/// trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    fields: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Builds a vector from `(field, value)` pairs, keeping their order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (fields, values) = pairs
            .into_iter()
            .map(|(field, value)| (field.into(), value))
            .unzip();
        Self { fields, values }
    }

    /// Field names, in column order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Values, aligned with [`Self::fields`].
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of `field`, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|i| self.values[i])
    }

    /// Iterates `(field, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the vector has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns a copy without `field`.
    #[must_use]
    pub fn without(&self, field: &str) -> Self {
        Self::from_pairs(
            self.iter()
                .filter(|(f, _)| *f != field)
                .map(|(f, v)| (f.to_string(), v)),
        )
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field, &value)?;
        }
        map.end()
    }
}
