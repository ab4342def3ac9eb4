use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::FaceId;

/// One face in a named feature, with an optional per-member sub-name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMember {
    pub face_id: FaceId,
    #[serde(default)]
    pub sub_name: Option<String>,
}

impl FeatureMember {
    pub fn new(face_id: impl Into<FaceId>) -> Self {
        Self {
            face_id: face_id.into(),
            sub_name: None,
        }
    }

    pub fn named(face_id: impl Into<FaceId>, sub_name: impl Into<String>) -> Self {
        Self {
            face_id: face_id.into(),
            sub_name: Some(sub_name.into()),
        }
    }
}

/// Export input: feature name to ordered member list.
///
/// A `BTreeMap` keeps export output independent of insertion order.
pub type FeatureMap = BTreeMap<String, Vec<FeatureMember>>;
