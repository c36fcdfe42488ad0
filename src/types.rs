/// Pose of a tracked object after fusion.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Unit quaternion [x, y, z, w].
    pub rotation: [f32; 4],
    /// Position in meters [x, y, z].
    pub position: [f32; 3],
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        rotation: [0.0, 0.0, 0.0, 1.0],
        position: [0.0, 0.0, 0.0],
    };
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Undecoded pose fields exactly as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawPose {
    /// Position [x, y, z] in units of 0.1 mm.
    pub position: [i16; 3],
    /// Quaternion in wire order [w, x, y, z], not normalized.
    pub orientation: [i16; 4],
}

bitflags::bitflags! {
    /// Button bitmask carried in each controller record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[repr(C)]
    pub struct Buttons: u8 {
        const PAD       = 1 << 0;
        const TRIGGER   = 1 << 1;
        const MENU      = 1 << 2;
        const SYSTEM    = 1 << 3;
        const GRIP      = 1 << 4;
        const PAD_TOUCH = 1 << 5;
    }
}

/// One hand controller as decoded from a controller-pair report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerReport {
    pub raw: RawPose,
    pub buttons: Buttons,
    /// Touchpad coordinates, 0..=255 on each axis.
    pub touch: [u8; 2],
    pub battery: u8,
}

/// Stored state of one controller slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerState {
    pub pose: Pose,
    pub buttons: Buttons,
    pub touch: [u8; 2],
    pub battery: u8,
}

/// HMD marker sub-record of an HMD frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HmdMarker {
    /// Position recorded when the kit was last recentered.
    pub home: [i16; 3],
    pub raw: RawPose,
}

/// Base-station sub-record of an HMD frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BaseStation {
    pub battery: u8,
}

/// Identity of an attachable NOLO device, produced by a registry scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub driver: String,
    pub vendor: String,
    pub product: String,
    /// Always 0 for this hardware.
    pub revision: i32,
    /// Transport path, owned copy of the enumeration record.
    pub path: String,
    /// Id of the `Driver` instance that produced this descriptor.
    pub driver_id: u64,
}

/// Default per-device properties set at open time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProperties {
    pub ipd: f32,
    pub znear: f32,
    pub zfar: f32,
    pub universal_distortion_k: [f32; 4],
    pub universal_aberration_k: [f32; 3],
}

impl Default for DeviceProperties {
    fn default() -> Self {
        Self {
            ipd: 0.061,
            znear: 0.1,
            zfar: 1000.0,
            universal_distortion_k: [0.0, 0.0, 0.0, 1.0],
            universal_aberration_k: [1.0, 1.0, 1.0],
        }
    }
}

/// Float value kinds a host may query. Codes are part of the C ABI.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatKind {
    RotationQuat = 1,
    LeftEyeGlModelviewMatrix = 2,
    RightEyeGlModelviewMatrix = 3,
    LeftEyeGlProjectionMatrix = 4,
    RightEyeGlProjectionMatrix = 5,
    PositionVector = 6,
    ScreenHorizontalSize = 7,
    ScreenVerticalSize = 8,
    LensHorizontalSeparation = 9,
    LensVerticalPosition = 10,
    LeftEyeFov = 11,
    LeftEyeAspectRatio = 12,
    RightEyeFov = 13,
    RightEyeAspectRatio = 14,
    EyeIpd = 15,
    ProjectionZfar = 16,
    ProjectionZnear = 17,
    DistortionK = 18,
}

impl FloatKind {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for FloatKind {
    type Error = crate::NoloError;

    fn try_from(code: i32) -> crate::Result<Self> {
        use FloatKind::*;
        Ok(match code {
            1 => RotationQuat,
            2 => LeftEyeGlModelviewMatrix,
            3 => RightEyeGlModelviewMatrix,
            4 => LeftEyeGlProjectionMatrix,
            5 => RightEyeGlProjectionMatrix,
            6 => PositionVector,
            7 => ScreenHorizontalSize,
            8 => ScreenVerticalSize,
            9 => LensHorizontalSeparation,
            10 => LensVerticalPosition,
            11 => LeftEyeFov,
            12 => LeftEyeAspectRatio,
            13 => RightEyeFov,
            14 => RightEyeAspectRatio,
            15 => EyeIpd,
            16 => ProjectionZfar,
            17 => ProjectionZnear,
            18 => DistortionK,
            other => return Err(crate::NoloError::InvalidFloatKind(other)),
        })
    }
}

/// Snapshot returned by a float query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloatValue {
    Quat([f32; 4]),
    Vec3([f32; 3]),
}

impl FloatValue {
    pub fn as_slice(&self) -> &[f32] {
        match self {
            FloatValue::Quat(q) => q,
            FloatValue::Vec3(v) => v,
        }
    }
}
