#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feature schema for the road risk classifier.
//!
//! A [`FeatureSchema`] is the ordered list of columns the classifier was
//! fit on: numeric fields passed through (optionally standardized) and
//! one-hot indicator columns named `<Field>_<Level>` for every categorical
//! level except the dropped baseline. The schema is computed once at
//! training time and stored next to the classifier, so [`FeatureSchema::encode`]
//! never has to inspect a dataset at inference time.

pub mod conditions;
pub mod schema;
pub mod vector;

pub use conditions::RawConditions;
pub use schema::{DeriveOptions, FeatureColumn, FeatureSchema, Standardization};
pub use vector::FeatureVector;

/// Errors from building or applying a feature schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// No feature columns could be determined (no reference dataset or
    /// an empty column list).
    #[error("Feature schema could not be determined: {message}")]
    Undetermined {
        /// Why the schema is empty.
        message: String,
    },

    /// The same column name appears twice.
    #[error("Duplicate feature column: {name}")]
    DuplicateField {
        /// The repeated column name.
        name: String,
    },

    /// A feature vector does not line up with the expected columns.
    #[error(transparent)]
    Mismatch(#[from] SchemaMismatch),
}

/// Difference between the columns a consumer expects and the columns a
/// feature vector actually carries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Feature schema mismatch: missing {missing:?}, unexpected {unexpected:?}, reordered: {reordered}"
)]
pub struct SchemaMismatch {
    /// Expected columns absent from the vector.
    pub missing: Vec<String>,
    /// Vector columns the consumer does not expect.
    pub unexpected: Vec<String>,
    /// Same column set, different order.
    pub reordered: bool,
}

impl SchemaMismatch {
    /// Compares `actual` against `expected` column for column.
    ///
    /// # Errors
    ///
    /// Returns the mismatch if the two lists differ in membership or order.
    pub fn check<E, A>(expected: &[E], actual: &[A]) -> Result<(), Self>
    where
        E: AsRef<str>,
        A: AsRef<str>,
    {
        if expected.len() == actual.len()
            && expected
                .iter()
                .zip(actual)
                .all(|(e, a)| e.as_ref() == a.as_ref())
        {
            return Ok(());
        }

        let missing: Vec<String> = expected
            .iter()
            .map(AsRef::as_ref)
            .filter(|e| !actual.iter().any(|a| a.as_ref() == *e))
            .map(String::from)
            .collect();
        let unexpected: Vec<String> = actual
            .iter()
            .map(AsRef::as_ref)
            .filter(|a| !expected.iter().any(|e| e.as_ref() == *a))
            .map(String::from)
            .collect();
        let reordered = missing.is_empty() && unexpected.is_empty();

        Err(Self {
            missing,
            unexpected,
            reordered,
        })
    }
}
