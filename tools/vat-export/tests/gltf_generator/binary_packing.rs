//! Binary data packing for GLTF buffers.

use super::mesh_data::{AnimationData, MeshData, compute_bounds};
use gltf_json as json;
use json::accessor::{ComponentType, Type};
use json::validation::Checked::Valid;

/// Pad `bytes` to a 4-byte boundary with `fill`
pub(crate) fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
    let padded = bytes.len().next_multiple_of(4);
    bytes.resize(padded, fill);
}

/// Packed buffer plus the views and accessors describing it
pub(crate) struct PackedData {
    pub buffer: Vec<u8>,
    pub views: Vec<json::buffer::View>,
    pub accessors: Vec<json::Accessor>,
    pub position: u32,
    pub normal: u32,
    pub uv: u32,
    pub joints: u32,
    pub weights: u32,
    pub indices: u32,
    pub inverse_bind: u32,
    /// (times, translations) accessor per animation
    pub animations: Vec<(u32, u32)>,
}

impl PackedData {
    /// Append `bytes` as a new view with one accessor over it
    fn push(
        &mut self,
        bytes: &[u8],
        count: usize,
        component: ComponentType,
        type_: Type,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
        target: Option<json::buffer::Target>,
    ) -> u32 {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);
        pad_to_four(&mut self.buffer, 0);

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some(offset.into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: target.map(Valid),
        });

        let (min, max) = match bounds {
            Some((min, max)) => (
                Some(json::Value::Array(
                    min.into_iter().map(json::Value::from).collect(),
                )),
                Some(json::Value::Array(
                    max.into_iter().map(json::Value::from).collect(),
                )),
            ),
            None => (None, None),
        };
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: count.into(),
            component_type: Valid(json::accessor::GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
        });
        self.accessors.len() as u32 - 1
    }
}

/// Pack all binary data into a single buffer
pub(crate) fn pack_binary_data(mesh: &MeshData, animations: &[AnimationData]) -> PackedData {
    let mut packed = PackedData {
        buffer: Vec::new(),
        views: Vec::new(),
        accessors: Vec::new(),
        position: 0,
        normal: 0,
        uv: 0,
        joints: 0,
        weights: 0,
        indices: 0,
        inverse_bind: 0,
        animations: Vec::new(),
    };
    let vertices = mesh.positions.len();
    let array = Some(json::buffer::Target::ArrayBuffer);

    // --- Mesh data ---
    let (min, max) = compute_bounds(&mesh.positions);
    packed.position = packed.push(
        bytemuck::cast_slice(&mesh.positions),
        vertices,
        ComponentType::F32,
        Type::Vec3,
        Some((min.to_vec(), max.to_vec())),
        array,
    );
    packed.normal = packed.push(
        bytemuck::cast_slice(&mesh.normals),
        vertices,
        ComponentType::F32,
        Type::Vec3,
        None,
        array,
    );
    packed.uv = packed.push(
        bytemuck::cast_slice(&mesh.uvs),
        vertices,
        ComponentType::F32,
        Type::Vec2,
        None,
        array,
    );
    packed.joints = packed.push(
        bytemuck::cast_slice(&mesh.joints),
        vertices,
        ComponentType::U8,
        Type::Vec4,
        None,
        array,
    );
    packed.weights = packed.push(
        bytemuck::cast_slice(&mesh.weights),
        vertices,
        ComponentType::F32,
        Type::Vec4,
        None,
        array,
    );
    packed.indices = packed.push(
        bytemuck::cast_slice(&mesh.indices),
        mesh.indices.len(),
        ComponentType::U16,
        Type::Scalar,
        None,
        Some(json::buffer::Target::ElementArrayBuffer),
    );

    // --- Skeleton data (identity inverse bind matrix) ---
    let identity: [f32; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];
    packed.inverse_bind = packed.push(
        bytemuck::cast_slice(&identity),
        1,
        ComponentType::F32,
        Type::Mat4,
        None,
        None,
    );

    // --- Animation data ---
    for animation in animations {
        let first = animation.times[0];
        let last = animation.times[animation.times.len() - 1];
        let times = packed.push(
            bytemuck::cast_slice(&animation.times),
            animation.times.len(),
            ComponentType::F32,
            Type::Scalar,
            Some((vec![first], vec![last])),
            None,
        );
        let translations = packed.push(
            bytemuck::cast_slice(&animation.translations),
            animation.translations.len(),
            ComponentType::F32,
            Type::Vec3,
            None,
            None,
        );
        packed.animations.push((times, translations));
    }

    packed
}
