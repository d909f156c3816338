//! glTF animation clips
//!
//! Reads every TRS channel of a glTF animation into owned keyframe tracks
//! and evaluates them at arbitrary times (step, linear and cubic-spline,
//! with slerp for linear rotations).

use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation;

use crate::bake::AnimationClip;
use crate::error::BakeError;

/// Animated node property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrsProperty {
    Translation,
    Rotation,
    Scale,
}

/// One keyframe track driving one property of one node.
///
/// Values are stored as 4 components; vec3 tracks leave `w` at 0. For
/// cubic-spline tracks each keyframe holds `[in_tangent, value, out_tangent]`.
#[derive(Debug, Clone)]
pub struct Track {
    pub node: usize,
    pub property: TrsProperty,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: Vec<[f32; 4]>,
}

impl Track {
    fn value(&self, key: usize) -> [f32; 4] {
        match self.interpolation {
            Interpolation::CubicSpline => self.values[key * 3 + 1],
            _ => self.values[key],
        }
    }

    /// Evaluate at `time`; times outside the keyframes clamp to the ends
    pub fn sample(&self, time: f32) -> [f32; 4] {
        let count = self.times.len();
        if count == 0 {
            return identity(self.property);
        }
        let last = count - 1;
        if count == 1 || time <= self.times[0] {
            return self.value(0);
        }
        if time >= self.times[last] {
            return self.value(last);
        }

        // First key strictly after `time`
        let next = self.times.partition_point(|&t| t <= time).clamp(1, last);
        let key = next - 1;
        let t0 = self.times[key];
        let t1 = self.times[next];
        let dt = t1 - t0;
        let factor = if dt > 0.0 {
            ((time - t0) / dt).clamp(0.0, 1.0)
        } else {
            0.0
        };

        match self.interpolation {
            Interpolation::Step => self.value(key),
            Interpolation::Linear => {
                let (a, b) = (self.value(key), self.value(next));
                if self.property == TrsProperty::Rotation {
                    slerp(a, b, factor)
                } else {
                    lerp(a, b, factor)
                }
            }
            Interpolation::CubicSpline => {
                let v0 = self.values[key * 3 + 1];
                let out0 = self.values[key * 3 + 2];
                let in1 = self.values[next * 3];
                let v1 = self.values[next * 3 + 1];
                let value = hermite(v0, out0, in1, v1, factor, dt);
                if self.property == TrsProperty::Rotation {
                    normalize_quat(value)
                } else {
                    value
                }
            }
        }
    }
}

fn identity(property: TrsProperty) -> [f32; 4] {
    match property {
        TrsProperty::Translation => [0.0, 0.0, 0.0, 0.0],
        TrsProperty::Rotation => [0.0, 0.0, 0.0, 1.0],
        TrsProperty::Scale => [1.0, 1.0, 1.0, 0.0],
    }
}

fn lerp(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

fn hermite(v0: [f32; 4], out0: [f32; 4], in1: [f32; 4], v1: [f32; 4], t: f32, dt: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    std::array::from_fn(|i| h00 * v0[i] + h10 * dt * out0[i] + h01 * v1[i] + h11 * dt * in1[i])
}

fn slerp(q0: [f32; 4], q1: [f32; 4], t: f32) -> [f32; 4] {
    let mut dot = q0[0] * q1[0] + q0[1] * q1[1] + q0[2] * q1[2] + q0[3] * q1[3];

    // Shortest path
    let mut q1 = q1;
    if dot < 0.0 {
        q1 = q1.map(|c| -c);
        dot = -dot;
    }

    // Nearly parallel: lerp is stable and indistinguishable
    if dot > 0.9995 {
        return normalize_quat(lerp(q0, q1, t));
    }

    let theta_0 = dot.acos();
    let theta = theta_0 * t;
    let sin_theta = theta.sin();
    let sin_theta_0 = theta_0.sin();

    let s0 = theta.cos() - dot * sin_theta / sin_theta_0;
    let s1 = sin_theta / sin_theta_0;

    std::array::from_fn(|i| s0 * q0[i] + s1 * q1[i])
}

fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if len > 0.0 {
        q.map(|c| c / len)
    } else {
        [0.0, 0.0, 0.0, 1.0]
    }
}

/// An animation read from a glTF document.
///
/// Tracks address nodes by index, so a clip only applies to meshes from the
/// same document.
#[derive(Debug, Clone)]
pub struct GltfClip {
    name: String,
    length: f32,
    tracks: Vec<Track>,
}

impl GltfClip {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let length = tracks
            .iter()
            .filter_map(|track| track.times.last().copied())
            .fold(0.0f32, f32::max);
        Self {
            name: name.into(),
            length,
            tracks,
        }
    }

    pub(crate) fn read(
        animation: &gltf::Animation,
        buffers: &[gltf::buffer::Data],
    ) -> Result<Self, BakeError> {
        let name = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("animation_{}", animation.index()));

        let mut tracks = Vec::new();
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
            let times: Vec<f32> = reader
                .read_inputs()
                .ok_or_else(|| {
                    BakeError::Configuration(format!("animation '{}': channel has no input", name))
                })?
                .collect();
            let outputs = reader.read_outputs().ok_or_else(|| {
                BakeError::Configuration(format!("animation '{}': channel has no output", name))
            })?;

            let (property, values): (TrsProperty, Vec<[f32; 4]>) = match outputs {
                ReadOutputs::Translations(iter) => (
                    TrsProperty::Translation,
                    iter.map(|[x, y, z]| [x, y, z, 0.0]).collect(),
                ),
                ReadOutputs::Rotations(iter) => {
                    (TrsProperty::Rotation, iter.into_f32().collect())
                }
                ReadOutputs::Scales(iter) => (
                    TrsProperty::Scale,
                    iter.map(|[x, y, z]| [x, y, z, 0.0]).collect(),
                ),
                ReadOutputs::MorphTargetWeights(_) => {
                    tracing::debug!("animation '{}': skipping morph target weights", name);
                    continue;
                }
            };

            let interpolation = channel.sampler().interpolation();
            let per_key = if interpolation == Interpolation::CubicSpline { 3 } else { 1 };
            if values.len() != times.len() * per_key {
                return Err(BakeError::Configuration(format!(
                    "animation '{}': {} keyframes but {} values",
                    name,
                    times.len(),
                    values.len()
                )));
            }

            tracks.push(Track {
                node: channel.target().node().index(),
                property,
                interpolation,
                times,
                values,
            });
        }

        Ok(Self::new(name, tracks))
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

impl AnimationClip for GltfClip {
    fn name(&self) -> &str {
        &self.name
    }

    fn length(&self) -> f32 {
        self.length
    }
}
