use crate::types::{Pose, RawPose};

/// Position units on the wire are 0.1 mm.
pub const POSITION_SCALE: f32 = 0.0001;

/// Turns decoded raw pose fields into a pose ready for the host.
///
/// Implementations may filter across calls. Returning `None` leaves the
/// destination slot untouched, so a slot only ever holds a fully written
/// pose.
pub trait PoseFusion {
    fn fuse(&mut self, raw: &RawPose) -> Option<Pose>;
}

/// Stateless fusion: scale the position and normalize the quaternion.
#[derive(Debug, Clone, Copy)]
pub struct ScaledFusion {
    pub position_scale: f32,
}

impl Default for ScaledFusion {
    fn default() -> Self {
        Self {
            position_scale: POSITION_SCALE,
        }
    }
}

impl PoseFusion for ScaledFusion {
    fn fuse(&mut self, raw: &RawPose) -> Option<Pose> {
        let rotation = normalize_quat(raw.orientation)?;
        let [x, y, z] = raw.position;
        Some(Pose {
            rotation,
            position: [
                x as f32 * self.position_scale,
                y as f32 * self.position_scale,
                z as f32 * self.position_scale,
            ],
        })
    }
}

/// Normalize a wire quaternion [w, x, y, z] into [x, y, z, w].
/// `None` for the zero quaternion.
pub fn normalize_quat(q: [i16; 4]) -> Option<[f32; 4]> {
    let [w, x, y, z] = q.map(f64::from);
    let norm = (w * w + x * x + y * y + z * z).sqrt();
    if norm == 0.0 {
        return None;
    }
    let s = 1.0 / norm;
    Some([
        (x * s) as f32,
        (y * s) as f32,
        (z * s) as f32,
        (w * s) as f32,
    ])
}
