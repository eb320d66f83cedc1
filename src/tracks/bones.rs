/// Canonical humanoid bones, in the order used to break frame-count ties.
pub const HUMANOID_BONES: [&str; 22] = [
    "Hips",
    "Spine",
    "Spine1",
    "Spine2",
    "Neck",
    "Head",
    "RightShoulder",
    "RightArm",
    "RightForeArm",
    "RightHand",
    "LeftShoulder",
    "LeftArm",
    "LeftForeArm",
    "LeftHand",
    "RightUpLeg",
    "RightLeg",
    "RightFoot",
    "RightToeBase",
    "LeftUpLeg",
    "LeftLeg",
    "LeftFoot",
    "LeftToeBase",
];

/// Owned copy of [`HUMANOID_BONES`] for configuration.
pub fn default_bones() -> Vec<String> {
    HUMANOID_BONES.iter().map(|b| (*b).to_string()).collect()
}
