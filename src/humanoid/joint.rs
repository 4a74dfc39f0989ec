//! 人形关节分类

/// 身体左右侧
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// 标准人形骨骼的关节分类（顺序即映射顺序，父关节总在子关节之前）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalJoint {
    Hips,
    LeftUpperLeg,
    RightUpperLeg,
    LeftLowerLeg,
    RightLowerLeg,
    LeftFoot,
    RightFoot,
    Spine,
    Chest,
    UpperChest,
    Neck,
    Head,
    LeftShoulder,
    RightShoulder,
    LeftUpperArm,
    RightUpperArm,
    LeftLowerArm,
    RightLowerArm,
    LeftHand,
    RightHand,
    LeftToes,
    RightToes,
    LeftEye,
    RightEye,
    Jaw,
    LeftThumbProximal,
    LeftThumbIntermediate,
    LeftThumbDistal,
    LeftIndexProximal,
    LeftIndexIntermediate,
    LeftIndexDistal,
    LeftMiddleProximal,
    LeftMiddleIntermediate,
    LeftMiddleDistal,
    LeftRingProximal,
    LeftRingIntermediate,
    LeftRingDistal,
    LeftLittleProximal,
    LeftLittleIntermediate,
    LeftLittleDistal,
    RightThumbProximal,
    RightThumbIntermediate,
    RightThumbDistal,
    RightIndexProximal,
    RightIndexIntermediate,
    RightIndexDistal,
    RightMiddleProximal,
    RightMiddleIntermediate,
    RightMiddleDistal,
    RightRingProximal,
    RightRingIntermediate,
    RightRingDistal,
    RightLittleProximal,
    RightLittleIntermediate,
    RightLittleDistal,
}

use CanonicalJoint::*;

impl CanonicalJoint {
    pub const COUNT: usize = 55;

    /// 全部关节，按分类顺序
    pub const ALL: [CanonicalJoint; Self::COUNT] = [
        Hips,
        LeftUpperLeg,
        RightUpperLeg,
        LeftLowerLeg,
        RightLowerLeg,
        LeftFoot,
        RightFoot,
        Spine,
        Chest,
        UpperChest,
        Neck,
        Head,
        LeftShoulder,
        RightShoulder,
        LeftUpperArm,
        RightUpperArm,
        LeftLowerArm,
        RightLowerArm,
        LeftHand,
        RightHand,
        LeftToes,
        RightToes,
        LeftEye,
        RightEye,
        Jaw,
        LeftThumbProximal,
        LeftThumbIntermediate,
        LeftThumbDistal,
        LeftIndexProximal,
        LeftIndexIntermediate,
        LeftIndexDistal,
        LeftMiddleProximal,
        LeftMiddleIntermediate,
        LeftMiddleDistal,
        LeftRingProximal,
        LeftRingIntermediate,
        LeftRingDistal,
        LeftLittleProximal,
        LeftLittleIntermediate,
        LeftLittleDistal,
        RightThumbProximal,
        RightThumbIntermediate,
        RightThumbDistal,
        RightIndexProximal,
        RightIndexIntermediate,
        RightIndexDistal,
        RightMiddleProximal,
        RightMiddleIntermediate,
        RightMiddleDistal,
        RightRingProximal,
        RightRingIntermediate,
        RightRingDistal,
        RightLittleProximal,
        RightLittleIntermediate,
        RightLittleDistal,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn side(self) -> Option<Side> {
        let name = self.as_str();
        if name.starts_with("Left") {
            Some(Side::Left)
        } else if name.starts_with("Right") {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// 去掉左右前缀后的部位名，例如 LeftUpperArm -> UpperArm
    pub fn stem(self) -> &'static str {
        let name = self.as_str();
        name.strip_prefix("Left")
            .or_else(|| name.strip_prefix("Right"))
            .unwrap_or(name)
    }

    pub fn is_finger(self) -> bool {
        (LeftThumbProximal..=RightLittleDistal).contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Hips => "Hips",
            LeftUpperLeg => "LeftUpperLeg",
            RightUpperLeg => "RightUpperLeg",
            LeftLowerLeg => "LeftLowerLeg",
            RightLowerLeg => "RightLowerLeg",
            LeftFoot => "LeftFoot",
            RightFoot => "RightFoot",
            Spine => "Spine",
            Chest => "Chest",
            UpperChest => "UpperChest",
            Neck => "Neck",
            Head => "Head",
            LeftShoulder => "LeftShoulder",
            RightShoulder => "RightShoulder",
            LeftUpperArm => "LeftUpperArm",
            RightUpperArm => "RightUpperArm",
            LeftLowerArm => "LeftLowerArm",
            RightLowerArm => "RightLowerArm",
            LeftHand => "LeftHand",
            RightHand => "RightHand",
            LeftToes => "LeftToes",
            RightToes => "RightToes",
            LeftEye => "LeftEye",
            RightEye => "RightEye",
            Jaw => "Jaw",
            LeftThumbProximal => "LeftThumbProximal",
            LeftThumbIntermediate => "LeftThumbIntermediate",
            LeftThumbDistal => "LeftThumbDistal",
            LeftIndexProximal => "LeftIndexProximal",
            LeftIndexIntermediate => "LeftIndexIntermediate",
            LeftIndexDistal => "LeftIndexDistal",
            LeftMiddleProximal => "LeftMiddleProximal",
            LeftMiddleIntermediate => "LeftMiddleIntermediate",
            LeftMiddleDistal => "LeftMiddleDistal",
            LeftRingProximal => "LeftRingProximal",
            LeftRingIntermediate => "LeftRingIntermediate",
            LeftRingDistal => "LeftRingDistal",
            LeftLittleProximal => "LeftLittleProximal",
            LeftLittleIntermediate => "LeftLittleIntermediate",
            LeftLittleDistal => "LeftLittleDistal",
            RightThumbProximal => "RightThumbProximal",
            RightThumbIntermediate => "RightThumbIntermediate",
            RightThumbDistal => "RightThumbDistal",
            RightIndexProximal => "RightIndexProximal",
            RightIndexIntermediate => "RightIndexIntermediate",
            RightIndexDistal => "RightIndexDistal",
            RightMiddleProximal => "RightMiddleProximal",
            RightMiddleIntermediate => "RightMiddleIntermediate",
            RightMiddleDistal => "RightMiddleDistal",
            RightRingProximal => "RightRingProximal",
            RightRingIntermediate => "RightRingIntermediate",
            RightRingDistal => "RightRingDistal",
            RightLittleProximal => "RightLittleProximal",
            RightLittleIntermediate => "RightLittleIntermediate",
            RightLittleDistal => "RightLittleDistal",
        }
    }
}

impl std::fmt::Display for CanonicalJoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
