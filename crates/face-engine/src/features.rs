//! Named feature bookkeeping.

use std::collections::HashSet;

use label_types::{FaceId, FeatureMap, FeatureMember};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::FeatureError;

/// Display colours handed out to new features in turn.
pub const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// A named group of faces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub name: String,
    /// Display only.
    pub color: String,
    pub members: Vec<FeatureMember>,
}

/// The session's features, in creation order.
///
/// Invariants: names are unique identifiers and every face belongs to at
/// most one feature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    features: Vec<Feature>,
    next_color: usize,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    /// The feature a face belongs to.
    pub fn owner_of(&self, face: FaceId) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.members.iter().any(|m| m.face_id == face))
    }

    /// Create a feature over faces `0..num_faces`.
    pub fn create(
        &mut self,
        name: &str,
        members: Vec<FeatureMember>,
        num_faces: usize,
    ) -> Result<&Feature, FeatureError> {
        validate_identifier(name)?;
        if self.get(name).is_some() {
            return Err(FeatureError::DuplicateName {
                name: name.to_string(),
            });
        }
        if members.is_empty() {
            return Err(FeatureError::NoMembers);
        }

        let mut seen = HashSet::new();
        for member in &members {
            let face_id = member.face_id;
            if face_id.index() >= num_faces {
                return Err(FeatureError::UnknownFace { face_id });
            }
            if !seen.insert(face_id) {
                return Err(FeatureError::RepeatedFace { face_id });
            }
            if let Some(owner) = self.owner_of(face_id) {
                return Err(FeatureError::FaceAlreadyOwned {
                    face_id,
                    owner: owner.name.clone(),
                });
            }
            if let Some(sub_name) = &member.sub_name {
                validate_identifier(sub_name)?;
            }
        }

        let color = PALETTE[self.next_color % PALETTE.len()].to_string();
        self.next_color += 1;
        let index = self.features.len();
        self.features.push(Feature {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color,
            members,
        });
        Ok(&self.features[index])
    }

    pub fn delete(&mut self, name: &str) -> Result<Feature, FeatureError> {
        let index = self.position(name)?;
        Ok(self.features.remove(index))
    }

    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<(), FeatureError> {
        let index = self.position(name)?;
        if name == new_name {
            return Ok(());
        }
        validate_identifier(new_name)?;
        if self.get(new_name).is_some() {
            return Err(FeatureError::DuplicateName {
                name: new_name.to_string(),
            });
        }
        self.features[index].name = new_name.to_string();
        Ok(())
    }

    /// Set or clear the sub-name of a face that belongs to a feature.
    pub fn set_sub_name(
        &mut self,
        face: FaceId,
        sub_name: Option<String>,
    ) -> Result<(), FeatureError> {
        if let Some(sub_name) = &sub_name {
            validate_identifier(sub_name)?;
        }
        let member = self
            .features
            .iter_mut()
            .flat_map(|f| f.members.iter_mut())
            .find(|m| m.face_id == face)
            .ok_or(FeatureError::Unassigned { face_id: face })?;
        member.sub_name = sub_name;
        Ok(())
    }

    /// Remove every feature. The colour sequence continues.
    pub fn clear(&mut self) {
        self.features.clear();
    }

    /// Export input for the current features.
    pub fn to_feature_map(&self) -> FeatureMap {
        self.features
            .iter()
            .map(|f| (f.name.clone(), f.members.clone()))
            .collect()
    }

    fn position(&self, name: &str) -> Result<usize, FeatureError> {
        self.features
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| FeatureError::UnknownFeature {
                name: name.to_string(),
            })
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn validate_identifier(name: &str) -> Result<(), FeatureError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(FeatureError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(ids: &[u32]) -> Vec<FeatureMember> {
        ids.iter().map(|&id| FeatureMember::new(id)).collect()
    }

    #[test]
    fn identifiers() {
        assert!(validate_identifier("mounting_boss").is_ok());
        assert!(validate_identifier("_datum2").is_ok());
        for bad in ["", "2nd", "has space", "dash-ed", "dot.ted", "ümlaut"] {
            assert!(validate_identifier(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn create_and_lookup() {
        let mut set = FeatureSet::new();
        let feature = set.create("boss", members(&[3, 4]), 10).unwrap();
        assert_eq!(feature.color, PALETTE[0]);
        assert_eq!(set.owner_of(FaceId(4)).map(|f| f.name.as_str()), Some("boss"));
        assert!(set.owner_of(FaceId(5)).is_none());
    }

    #[test]
    fn faces_belong_to_one_feature() {
        let mut set = FeatureSet::new();
        set.create("a", members(&[1]), 5).unwrap();
        assert_eq!(
            set.create("b", members(&[2, 1]), 5).unwrap_err(),
            FeatureError::FaceAlreadyOwned {
                face_id: FaceId(1),
                owner: "a".into()
            }
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn rejects_bad_members() {
        let mut set = FeatureSet::new();
        assert_eq!(set.create("a", vec![], 5).unwrap_err(), FeatureError::NoMembers);
        assert_eq!(
            set.create("a", members(&[5]), 5).unwrap_err(),
            FeatureError::UnknownFace { face_id: FaceId(5) }
        );
        assert_eq!(
            set.create("a", members(&[2, 2]), 5).unwrap_err(),
            FeatureError::RepeatedFace { face_id: FaceId(2) }
        );
        let bad_sub = vec![FeatureMember::named(0u32, "no good")];
        assert!(matches!(
            set.create("a", bad_sub, 5),
            Err(FeatureError::InvalidIdentifier { .. })
        ));
        assert!(set.is_empty());
    }

    #[test]
    fn names_are_unique() {
        let mut set = FeatureSet::new();
        set.create("a", members(&[0]), 5).unwrap();
        set.create("b", members(&[1]), 5).unwrap();
        assert!(matches!(
            set.create("a", members(&[2]), 5),
            Err(FeatureError::DuplicateName { .. })
        ));
        assert!(matches!(set.rename("b", "a"), Err(FeatureError::DuplicateName { .. })));
        set.rename("b", "c").unwrap();
        assert!(set.get("c").is_some());
        assert!(set.get("b").is_none());
    }

    #[test]
    fn delete_frees_faces() {
        let mut set = FeatureSet::new();
        set.create("a", members(&[0, 1]), 5).unwrap();
        let removed = set.delete("a").unwrap();
        assert_eq!(removed.members.len(), 2);
        set.create("b", members(&[1]), 5).unwrap();
        assert!(matches!(set.delete("a"), Err(FeatureError::UnknownFeature { .. })));
    }

    #[test]
    fn sub_names() {
        let mut set = FeatureSet::new();
        set.create("boss", members(&[3, 4]), 10).unwrap();
        set.set_sub_name(FaceId(4), Some("top".into())).unwrap();
        assert_eq!(set.to_feature_map()["boss"][1], FeatureMember::named(4u32, "top"));
        set.set_sub_name(FaceId(4), None).unwrap();
        assert_eq!(set.to_feature_map()["boss"][1].sub_name, None);
        assert_eq!(
            set.set_sub_name(FaceId(9), Some("x".into())).unwrap_err(),
            FeatureError::Unassigned { face_id: FaceId(9) }
        );
    }

    #[test]
    fn colours_cycle_through_palette() {
        let mut set = FeatureSet::new();
        for i in 0..12u32 {
            set.create(&format!("f{i}"), members(&[i]), 20).unwrap();
        }
        let colors: Vec<&str> = set.iter().map(|f| f.color.as_str()).collect();
        assert_eq!(colors[0], PALETTE[0]);
        assert_eq!(colors[9], PALETTE[9]);
        assert_eq!(colors[10], PALETTE[0]);
        assert_eq!(colors[11], PALETTE[1]);
    }
}
