//! Opaque identifiers shared by the count and result pipelines.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Gene identifier as written by the aligner and the annotation (e.g. `ENSG00000141510.18`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneId(String);

/// Sample label; one per aligner run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(GeneId);
string_id!(SampleId);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_gene_ids_borrow_as_str_in_sets() {
        let set: BTreeSet<GeneId> = ["g2", "g1"].into_iter().map(GeneId::from).collect();
        assert!(set.contains("g1"));
        assert_eq!(set.iter().next().map(GeneId::as_str), Some("g1"));
    }

    #[test]
    fn test_sample_id_display() {
        assert_eq!(SampleId::new("hugelymodelbat").to_string(), "hugelymodelbat");
    }
}
