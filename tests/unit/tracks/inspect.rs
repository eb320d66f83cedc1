use std::path::Path;

use super::*;
use crate::tracks::bones::default_bones;

fn track_json(bones: &[(&str, usize)]) -> String {
    let mut doc = serde_json::Map::new();
    for (bone, len) in bones {
        let times: Vec<f64> = (0..*len).map(|i| i as f64 / 30.0).collect();
        doc.insert(
            (*bone).to_string(),
            serde_json::json!({ "times": times, "values": [], "type": "quaternion" }),
        );
    }
    serde_json::Value::Object(doc).to_string()
}

fn dataset(root: &Path, anims: &[(&str, &[(&str, usize)])]) -> PipelineConfig {
    let cfg = PipelineConfig {
        dataset_root: root.to_path_buf(),
        ..PipelineConfig::default()
    };
    std::fs::create_dir_all(cfg.tracks_path()).unwrap();
    for (name, bones) in anims {
        std::fs::write(cfg.track_file(name), track_json(bones)).unwrap();
    }
    cfg
}

#[test]
fn non_humanoid_bones_are_ignored() {
    let json = track_json(&[("Hips", 40), ("Head", 12), ("NonHumanoidProp", 999)]);
    let bones = default_bones();
    let set = AnimationTrackSet::from_slice(json.as_bytes(), &bones).unwrap();
    assert_eq!(set.bone_count(), 2);
    assert_eq!(set.len_of("NonHumanoidProp"), None);
    assert_eq!(dominant_track(&set, &bones), (40, "Hips".to_string()));
}

#[test]
fn non_humanoid_payload_shape_is_not_checked() {
    let json = r#"{ "Hips": { "times": [0, 1, 2] }, "Prop": 7 }"#;
    let bones = default_bones();
    let set = AnimationTrackSet::from_slice(json.as_bytes(), &bones).unwrap();
    assert_eq!(dominant_track(&set, &bones), (3, "Hips".to_string()));
}

#[test]
fn no_humanoid_bone_yields_zero() {
    let json = track_json(&[("Tail", 80)]);
    let bones = default_bones();
    let set = AnimationTrackSet::from_slice(json.as_bytes(), &bones).unwrap();
    assert_eq!(dominant_track(&set, &bones), (0, String::new()));
}

#[test]
fn ties_resolve_to_earlier_canonical_bone() {
    let json = track_json(&[("LeftToeBase", 50), ("Spine", 50), ("Neck", 49)]);
    let bones = default_bones();
    let set = AnimationTrackSet::from_slice(json.as_bytes(), &bones).unwrap();
    assert_eq!(dominant_track(&set, &bones), (50, "Spine".to_string()));
}

#[test]
fn custom_bone_set_is_honored() {
    let json = track_json(&[("Hips", 40), ("Tail", 90)]);
    let bones = vec!["Tail".to_string()];
    let set = AnimationTrackSet::from_slice(json.as_bytes(), &bones).unwrap();
    assert_eq!(dominant_track(&set, &bones), (90, "Tail".to_string()));
}

#[test]
fn humanoid_bone_without_times_is_dataset_error() {
    let json = r#"{ "Hips": { "values": [1, 2] } }"#;
    let err = AnimationTrackSet::from_slice(json.as_bytes(), &default_bones()).unwrap_err();
    assert!(matches!(err, AnimcapError::Dataset(_)));
    assert!(err.to_string().contains("Hips"));
}

#[test]
fn threshold_is_thirty_frames() {
    assert!(!is_long(0));
    assert!(!is_long(29));
    assert!(is_long(30));
    assert!(is_long(120));
}

#[test]
fn inspect_all_classifies_and_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dataset(
        dir.path(),
        &[
            ("Walk", &[("Hips", 45), ("Head", 45)][..]),
            ("Wave", &[("RightHand", 10)][..]),
            ("Run", &[("Hips", 120), ("Prop", 500)][..]),
        ],
    );
    std::fs::write(cfg.track_file("Broken"), "{ not json").unwrap();

    let names: Vec<String> = ["Walk", "Broken", "Wave", "Missing", "Run"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let report = inspect_all(&cfg, &names);

    let long: Vec<(&str, u64)> = report
        .long
        .iter()
        .map(|j| (j.name.as_str(), j.frame_count))
        .collect();
    assert_eq!(long, vec![("Walk", 45), ("Run", 120)]);
    assert_eq!(report.short.len(), 1);
    assert_eq!(report.short[0].name, "Wave");
    assert_eq!(report.short[0].frame_count, 10);

    let failed: Vec<&str> = report.failures.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(failed, vec!["Broken", "Missing"]);
    assert!(report.failures.iter().all(|f| f.error.contains("dataset error")));
    assert_eq!(report.total(), 5);
}

#[test]
fn discover_sorts_filters_and_limits() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dataset(
        dir.path(),
        &[
            ("Run", &[("Hips", 1)][..]),
            ("Idle", &[("Hips", 1)][..]),
            ("Walk", &[("Hips", 1)][..]),
        ],
    );
    std::fs::write(cfg.tracks_path().join("notes.txt"), "x").unwrap();
    std::fs::create_dir_all(cfg.tracks_path().join("nested.json")).unwrap();

    assert_eq!(
        discover_animations(&cfg).unwrap(),
        vec!["Idle".to_string(), "Run".to_string(), "Walk".to_string()]
    );

    let limited = PipelineConfig {
        limit: Some(1),
        ..cfg
    };
    assert_eq!(discover_animations(&limited).unwrap(), vec!["Idle".to_string()]);
}

#[test]
fn discover_missing_directory_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig {
        dataset_root: dir.path().join("absent"),
        ..PipelineConfig::default()
    };
    assert!(discover_animations(&cfg).is_err());
}
