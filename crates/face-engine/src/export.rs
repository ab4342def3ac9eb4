//! Named export rewriter.
//!
//! Writes feature names into the `ADVANCED_FACE` name literals located by the
//! correlator. Pure text substitution on a copy of the input: bytes outside
//! the rewritten literals are preserved exactly. Faces with no textual
//! counterpart are skipped, never fatal.

use std::collections::HashMap;
use std::ops::Range;

use label_types::{FaceId, FaceInfo, FeatureMap, SurfaceKind};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::correlate::{Correspondence, CorrespondenceTable};
use crate::errors::ExportError;
use crate::features::validate_identifier;

/// Result of a named export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOutcome {
    /// The rewritten STEP text.
    pub text: String,
    /// Faces whose literal was written, with the name written.
    pub renamed: Vec<(FaceId, String)>,
    /// Faces named by a feature but absent from the text.
    pub skipped: Vec<FaceId>,
}

/// Proposed STEP name for every face referenced by `features`.
///
/// A feature with one member names it after the feature. Members of larger
/// features are named `feature.sub_name`; a missing sub-name defaults to the
/// face's surface type, numbered `type_1`, `type_2`, ... when several
/// defaulting members share a type. An explicit sub-name on a single member
/// is honoured too. Faces listed twice keep their first name.
pub fn plan_names(features: &FeatureMap, faces: &[FaceInfo]) -> Vec<(FaceId, String)> {
    let kind_of = |id: FaceId| {
        faces
            .get(id.index())
            .map_or(SurfaceKind::Other, |f| f.surface_type)
    };

    let mut planned: Vec<(FaceId, String)> = Vec::new();
    let mut owner: HashMap<FaceId, &str> = HashMap::new();

    for (feature, members) in features {
        let mut defaults_per_kind: HashMap<SurfaceKind, usize> = HashMap::new();
        for m in members.iter().filter(|m| m.sub_name.is_none()) {
            *defaults_per_kind.entry(kind_of(m.face_id)).or_default() += 1;
        }
        let mut numbered: HashMap<SurfaceKind, usize> = HashMap::new();

        for member in members {
            let name = match &member.sub_name {
                Some(sub) => format!("{feature}.{sub}"),
                None if members.len() == 1 => feature.clone(),
                None => {
                    let kind = kind_of(member.face_id);
                    if defaults_per_kind.get(&kind).copied().unwrap_or(0) > 1 {
                        let n = numbered.entry(kind).or_default();
                        *n += 1;
                        format!("{feature}.{kind}_{n}")
                    } else {
                        format!("{feature}.{kind}")
                    }
                }
            };

            if let Some(first) = owner.get(&member.face_id) {
                warn!(
                    face = %member.face_id,
                    kept = *first,
                    ignored = feature.as_str(),
                    "face listed in more than one feature; keeping the first"
                );
                continue;
            }
            owner.insert(member.face_id, feature.as_str());
            planned.push((member.face_id, name));
        }
    }
    planned
}

/// Rewrite the name literals of every mapped face named by `features`.
///
/// Feature names and sub-names must be identifiers. Fails when one is not,
/// when the text has no `ADVANCED_FACE` entities at all, or when a mapped
/// slot no longer holds a name field in `step_text`. Nothing is written on
/// failure.
#[instrument(skip_all, fields(features = features.len()))]
pub fn export_named(
    step_text: &str,
    table: &CorrespondenceTable,
    faces: &[FaceInfo],
    features: &FeatureMap,
) -> Result<ExportOutcome, ExportError> {
    validate_names(features)?;
    if table.is_empty() {
        return Err(ExportError::NoAdvancedFaces);
    }

    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut renamed = Vec::new();
    let mut skipped = Vec::new();

    for (face, name) in plan_names(features, faces) {
        match table.lookup(face) {
            Correspondence::Mapped(slot) => {
                check_slot(step_text, &slot.range, slot.entity_id)?;
                edits.push((slot.range.clone(), step_string(&name)));
                renamed.push((face, name));
            }
            Correspondence::Unmapped => skipped.push(face),
        }
    }
    if !skipped.is_empty() {
        warn!(
            count = skipped.len(),
            entities = table.len(),
            "faces without a STEP entity were not renamed"
        );
    }

    // Descending offsets keep earlier ranges valid while editing.
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    let mut text = step_text.to_string();
    for (range, literal) in edits {
        text.replace_range(range, &literal);
    }

    info!(renamed = renamed.len(), skipped = skipped.len(), "named export complete");
    Ok(ExportOutcome {
        text,
        renamed,
        skipped,
    })
}

fn validate_names(features: &FeatureMap) -> Result<(), ExportError> {
    for (feature, members) in features {
        let invalid = |source| ExportError::InvalidName {
            feature: feature.clone(),
            source,
        };
        validate_identifier(feature).map_err(invalid)?;
        for sub in members.iter().filter_map(|m| m.sub_name.as_deref()) {
            validate_identifier(sub).map_err(invalid)?;
        }
    }
    Ok(())
}

/// The range must still cover a whole `'...'` literal or a `$` in `text`.
fn check_slot(text: &str, range: &Range<usize>, entity_id: u64) -> Result<(), ExportError> {
    let field = text
        .get(range.clone())
        .map(str::as_bytes)
        .unwrap_or_default();
    if matches!(field, [b'$'] | [b'\'', .., b'\'']) {
        Ok(())
    } else {
        Err(ExportError::StaleCorrespondence { entity_id })
    }
}

/// STEP string literal for `value`: quoted, with `'` doubled.
fn step_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::correlate;
    use label_types::FeatureMember;

    fn faces(kinds: &[SurfaceKind]) -> Vec<FaceInfo> {
        kinds
            .iter()
            .enumerate()
            .map(|(i, &k)| FaceInfo::bare(FaceId::from(i), k))
            .collect()
    }

    fn map(entries: &[(&str, Vec<FeatureMember>)]) -> FeatureMap {
        entries
            .iter()
            .map(|(n, m)| (n.to_string(), m.clone()))
            .collect()
    }

    #[test]
    fn single_member_takes_feature_name() {
        let features = map(&[("datum_a", vec![FeatureMember::new(0u32)])]);
        let plan = plan_names(&features, &faces(&[SurfaceKind::Planar]));
        assert_eq!(plan, vec![(FaceId(0), "datum_a".to_string())]);
    }

    #[test]
    fn multi_member_defaults_to_surface_type() {
        use SurfaceKind::*;
        let features = map(&[(
            "boss",
            vec![
                FeatureMember::named(0u32, "top"),
                FeatureMember::new(1u32),
                FeatureMember::new(2u32),
                FeatureMember::new(3u32),
            ],
        )]);
        let plan = plan_names(&features, &faces(&[Planar, Cylindrical, Planar, Planar]));
        let names: Vec<&str> = plan.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["boss.top", "boss.cylindrical", "boss.planar_1", "boss.planar_2"]
        );
    }

    #[test]
    fn duplicate_face_keeps_first_feature() {
        let features = map(&[
            ("alpha", vec![FeatureMember::new(0u32)]),
            ("beta", vec![FeatureMember::new(0u32)]),
        ]);
        let plan = plan_names(&features, &faces(&[SurfaceKind::Planar]));
        assert_eq!(plan, vec![(FaceId(0), "alpha".to_string())]);
    }

    #[test]
    fn rewrites_only_the_literal() {
        let text = "#1=ADVANCED_FACE('',(#9),#8,.T.);\n#2 = ADVANCED_FACE( 'NONE' ,(#7),#6,.F.);\n";
        let table = correlate(text);
        let features = map(&[("side", vec![FeatureMember::new(1u32)])]);
        let out = export_named(text, &table, &faces(&[SurfaceKind::Planar; 2]), &features).unwrap();
        assert_eq!(
            out.text,
            "#1=ADVANCED_FACE('',(#9),#8,.T.);\n#2 = ADVANCED_FACE( 'side' ,(#7),#6,.F.);\n"
        );
        assert_eq!(out.renamed, vec![(FaceId(1), "side".to_string())]);
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn unset_name_is_replaced() {
        let text = "#1=ADVANCED_FACE($,(#9),#8,.T.);";
        let out = export_named(
            text,
            &correlate(text),
            &faces(&[SurfaceKind::Planar]),
            &map(&[("f", vec![FeatureMember::new(0u32)])]),
        )
        .unwrap();
        assert_eq!(out.text, "#1=ADVANCED_FACE('f',(#9),#8,.T.);");
    }

    #[test]
    fn names_that_are_not_identifiers_are_rejected() {
        let text = "#1=ADVANCED_FACE('',(#9),#8,.T.);";
        let table = correlate(text);
        let kinds = faces(&[SurfaceKind::Planar]);
        for (feature, sub) in [
            ("bohrung \u{f8}10\n);#2=X(", None),
            ("o'ring", None),
            ("seal", Some("it's")),
            ("seal", Some("line\nbreak")),
        ] {
            let member = match sub {
                Some(sub) => FeatureMember::named(0u32, sub),
                None => FeatureMember::new(0u32),
            };
            let result = export_named(text, &table, &kinds, &map(&[(feature, vec![member])]));
            match result {
                Err(ExportError::InvalidName { feature: named, .. }) => assert_eq!(named, feature),
                other => panic!("expected InvalidName for {feature:?}/{sub:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn literal_quotes_are_doubled() {
        assert_eq!(step_string("f.it's"), "'f.it''s'");
    }

    #[test]
    fn table_from_other_text_is_refused() {
        let original = "#1=ADVANCED_FACE('',(#9),#8,.T.);";
        let table = correlate(original);
        let features = map(&[("f", vec![FeatureMember::new(0u32)])]);
        let kinds = faces(&[SurfaceKind::Planar]);
        for other in ["#1=ADV", "#1=ADVANCED_FACE\u{e9}\u{e9}", "#1 = ADVANCED_FACE('',(#9),#8,.T.);"] {
            assert!(matches!(
                export_named(other, &table, &kinds, &features),
                Err(ExportError::StaleCorrespondence { entity_id: 1 })
            ));
        }
    }

    #[test]
    fn reexport_with_the_same_names_reuses_the_table() {
        let text = "#1=ADVANCED_FACE('f',(#9),#8,.T.);";
        let table = correlate(text);
        let features = map(&[("f", vec![FeatureMember::new(0u32)])]);
        let kinds = faces(&[SurfaceKind::Planar]);
        let once = export_named(text, &table, &kinds, &features).unwrap();
        let twice = export_named(&once.text, &table, &kinds, &features).unwrap();
        assert_eq!(once.text, text);
        assert_eq!(twice.text, once.text);
    }

    #[test]
    fn unmapped_faces_are_skipped() {
        let text = "#1=ADVANCED_FACE('',(#9),#8,.T.);";
        let features = map(&[(
            "pins",
            vec![FeatureMember::new(0u32), FeatureMember::new(5u32)],
        )]);
        let out = export_named(text, &correlate(text), &faces(&[SurfaceKind::Cylindrical; 6]), &features)
            .unwrap();
        assert_eq!(out.text, "#1=ADVANCED_FACE('pins.cylindrical_1',(#9),#8,.T.);");
        assert_eq!(out.skipped, vec![FaceId(5)]);
    }

    #[test]
    fn no_entities_is_an_error() {
        let text = "ISO-10303-21;\nDATA;\nENDSEC;\n";
        let result = export_named(text, &correlate(text), &[], &FeatureMap::new());
        assert!(matches!(result, Err(ExportError::NoAdvancedFaces)));
    }

    #[test]
    fn input_is_untouched_and_export_is_repeatable() {
        let text = "#1=ADVANCED_FACE('a',(#9),#8,.T.);#2=ADVANCED_FACE('b',(#9),#8,.T.);".to_string();
        let snapshot = text.clone();
        let table = correlate(&text);
        let features = map(&[("long_name", vec![FeatureMember::new(0u32)])]);
        let kinds = faces(&[SurfaceKind::Planar; 2]);
        let first = export_named(&text, &table, &kinds, &features).unwrap();
        let second = export_named(&text, &table, &kinds, &features).unwrap();
        assert_eq!(text, snapshot);
        assert_eq!(first, second);
    }
}
