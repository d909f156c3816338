//! Mesh, skeleton, and animation data for the test asset.

/// Vertices of the test quad
pub const QUAD_VERTEX_COUNT: usize = 4;
/// Length of the "Rise" clip in seconds
pub const RISE_LENGTH: f32 = 2.0;
/// Root joint height at the end of "Rise"
pub const RISE_HEIGHT: f32 = 1.0;

/// Mesh data for the test asset
pub(crate) struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub joints: Vec<[u8; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub indices: Vec<u16>,
}

/// One translation clip on the root joint
pub(crate) struct AnimationData {
    pub name: &'static str,
    pub times: Vec<f32>,
    pub translations: Vec<[f32; 3]>,
}

/// Unit quad on the XZ plane, every vertex fully bound to joint 0
pub(crate) fn create_mesh_data() -> MeshData {
    MeshData {
        positions: vec![
            [-0.5, 0.0, -0.5],
            [0.5, 0.0, -0.5],
            [0.5, 0.0, 0.5],
            [-0.5, 0.0, 0.5],
        ],
        normals: vec![[0.0, 1.0, 0.0]; QUAD_VERTEX_COUNT],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        joints: vec![[0, 0, 0, 0]; QUAD_VERTEX_COUNT],
        weights: vec![[1.0, 0.0, 0.0, 0.0]; QUAD_VERTEX_COUNT],
        indices: vec![0, 2, 1, 0, 3, 2],
    }
}

pub(crate) fn create_animations() -> Vec<AnimationData> {
    vec![
        AnimationData {
            name: "Rise",
            times: vec![0.0, RISE_LENGTH],
            translations: vec![[0.0, 0.0, 0.0], [0.0, RISE_HEIGHT, 0.0]],
        },
        AnimationData {
            name: "Hop",
            times: vec![0.0, 0.5, 1.0],
            translations: vec![[0.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 0.0]],
        },
    ]
}

/// Compute min/max bounds for positions
pub(crate) fn compute_bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for p in positions {
        for i in 0..3 {
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
    }
    (min, max)
}
