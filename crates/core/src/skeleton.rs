//! Joint names, normalized keypoints, and the shared bone topology.
//!
//! Joint names follow the 33 MediaPipe pose landmarks and travel over the
//! wire in SCREAMING_SNAKE_CASE (`"LEFT_SHOULDER"`). A [`KeypointSet`]
//! only holds joints the analyzer actually reported; absent joints are
//! simply missing from the map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Joint
// ---------------------------------------------------------------------------

/// A named anatomical landmark.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Joint {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Joint {
    /// Every joint, in landmark order.
    pub const ALL: [Joint; 33] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Wire name of the joint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "NOSE",
            Self::LeftEyeInner => "LEFT_EYE_INNER",
            Self::LeftEye => "LEFT_EYE",
            Self::LeftEyeOuter => "LEFT_EYE_OUTER",
            Self::RightEyeInner => "RIGHT_EYE_INNER",
            Self::RightEye => "RIGHT_EYE",
            Self::RightEyeOuter => "RIGHT_EYE_OUTER",
            Self::LeftEar => "LEFT_EAR",
            Self::RightEar => "RIGHT_EAR",
            Self::MouthLeft => "MOUTH_LEFT",
            Self::MouthRight => "MOUTH_RIGHT",
            Self::LeftShoulder => "LEFT_SHOULDER",
            Self::RightShoulder => "RIGHT_SHOULDER",
            Self::LeftElbow => "LEFT_ELBOW",
            Self::RightElbow => "RIGHT_ELBOW",
            Self::LeftWrist => "LEFT_WRIST",
            Self::RightWrist => "RIGHT_WRIST",
            Self::LeftPinky => "LEFT_PINKY",
            Self::RightPinky => "RIGHT_PINKY",
            Self::LeftIndex => "LEFT_INDEX",
            Self::RightIndex => "RIGHT_INDEX",
            Self::LeftThumb => "LEFT_THUMB",
            Self::RightThumb => "RIGHT_THUMB",
            Self::LeftHip => "LEFT_HIP",
            Self::RightHip => "RIGHT_HIP",
            Self::LeftKnee => "LEFT_KNEE",
            Self::RightKnee => "RIGHT_KNEE",
            Self::LeftAnkle => "LEFT_ANKLE",
            Self::RightAnkle => "RIGHT_ANKLE",
            Self::LeftHeel => "LEFT_HEEL",
            Self::RightHeel => "RIGHT_HEEL",
            Self::LeftFootIndex => "LEFT_FOOT_INDEX",
            Self::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }

    /// Look up a joint by its wire name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|j| j.as_str() == name)
    }
}

// ---------------------------------------------------------------------------
// Bone topology
// ---------------------------------------------------------------------------

/// A pair of joints drawn as a connecting segment.
pub type Bone = (Joint, Joint);

/// The bones drawn on every overlay, recorded and live alike.
pub const BONE_TOPOLOGY: &[Bone] = &[
    (Joint::LeftShoulder, Joint::RightShoulder),
    (Joint::LeftShoulder, Joint::LeftElbow),
    (Joint::LeftElbow, Joint::LeftWrist),
    (Joint::RightShoulder, Joint::RightElbow),
    (Joint::RightElbow, Joint::RightWrist),
    (Joint::LeftShoulder, Joint::LeftHip),
    (Joint::RightShoulder, Joint::RightHip),
    (Joint::LeftHip, Joint::RightHip),
    (Joint::LeftHip, Joint::LeftKnee),
    (Joint::LeftKnee, Joint::LeftAnkle),
    (Joint::RightHip, Joint::RightKnee),
    (Joint::RightKnee, Joint::RightAnkle),
];

// ---------------------------------------------------------------------------
// Keypoints
// ---------------------------------------------------------------------------

/// Position relative to the source image, `(0, 0)` top-left, `(1, 1)`
/// bottom-right. Serialized as a `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for NormalizedPoint {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<NormalizedPoint> for [f64; 2] {
    fn from(p: NormalizedPoint) -> Self {
        [p.x, p.y]
    }
}

/// Joint → normalized position for a single frame.
///
/// Deserializes leniently from `{"JOINT_NAME": [x, y, ...]}`: entries
/// with unknown joint names, fewer than two coordinates, or non-finite
/// values are dropped instead of failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Vec<f64>>",
    into = "BTreeMap<Joint, NormalizedPoint>"
)]
pub struct KeypointSet {
    points: BTreeMap<Joint, NormalizedPoint>,
}

impl KeypointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a joint's position, returning the previous one.
    pub fn insert(&mut self, joint: Joint, point: NormalizedPoint) -> Option<NormalizedPoint> {
        self.points.insert(joint, point)
    }

    pub fn get(&self, joint: Joint) -> Option<NormalizedPoint> {
        self.points.get(&joint).copied()
    }

    pub fn contains(&self, joint: Joint) -> bool {
        self.points.contains_key(&joint)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate in joint order.
    pub fn iter(&self) -> impl Iterator<Item = (Joint, NormalizedPoint)> + '_ {
        self.points.iter().map(|(j, p)| (*j, *p))
    }
}

impl FromIterator<(Joint, NormalizedPoint)> for KeypointSet {
    fn from_iter<I: IntoIterator<Item = (Joint, NormalizedPoint)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, Vec<f64>>> for KeypointSet {
    fn from(raw: BTreeMap<String, Vec<f64>>) -> Self {
        raw.into_iter()
            .filter_map(|(name, coords)| {
                let Some(joint) = Joint::from_name(&name) else {
                    tracing::trace!(joint = %name, "Ignoring unknown joint");
                    return None;
                };
                match coords.as_slice() {
                    [x, y, ..] if x.is_finite() && y.is_finite() => {
                        Some((joint, NormalizedPoint::new(*x, *y)))
                    }
                    _ => None,
                }
            })
            .collect()
    }
}

impl From<KeypointSet> for BTreeMap<Joint, NormalizedPoint> {
    fn from(set: KeypointSet) -> Self {
        set.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_names_round_trip() {
        for joint in Joint::ALL {
            assert_eq!(Joint::from_name(joint.as_str()), Some(joint));
        }
    }

    #[test]
    fn serde_name_matches_as_str() {
        let json = serde_json::to_string(&Joint::RightFootIndex).unwrap();
        assert_eq!(json, "\"RIGHT_FOOT_INDEX\"");
    }

    #[test]
    fn unknown_joint_name_is_none() {
        assert_eq!(Joint::from_name("LEFT_ANTENNA"), None);
    }

    #[test]
    fn topology_has_no_self_loops() {
        assert!(BONE_TOPOLOGY.iter().all(|(a, b)| a != b));
        assert_eq!(BONE_TOPOLOGY.len(), 12);
    }

    #[test]
    fn keypoints_parse_from_wire_map() {
        let json = r#"{"LEFT_SHOULDER":[0.4,0.3],"RIGHT_SHOULDER":[0.6,0.31]}"#;
        let set: KeypointSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.get(Joint::LeftShoulder),
            Some(NormalizedPoint::new(0.4, 0.3))
        );
    }

    #[test]
    fn keypoints_drop_unknown_and_short_entries() {
        let json = r#"{"NOSE":[0.5,0.1,0.9],"TAIL":[0.1,0.1],"LEFT_HIP":[0.2]}"#;
        let set: KeypointSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(Joint::Nose));
        assert!(!set.contains(Joint::LeftHip));
    }

    #[test]
    fn keypoints_serialize_as_pairs() {
        let set: KeypointSet = [(Joint::Nose, NormalizedPoint::new(0.5, 0.25))]
            .into_iter()
            .collect();
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value, serde_json::json!({"NOSE": [0.5, 0.25]}));
    }
}
