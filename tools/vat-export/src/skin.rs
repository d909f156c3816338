//! Skinned glTF mesh evaluation
//!
//! Poses the node hierarchy from a [`GltfClip`] and deforms the bind-pose
//! vertices with linear-blend skinning. Results are expressed in the mesh
//! node's own frame:
//!
//! ```text
//! joint_matrix[j] = inverse(global(mesh_node)) * global(joint[j]) * inverse_bind[j]
//! position        = Σ weight[k] * joint_matrix[joint[k]] * bind_position
//! ```

use glam::{Mat4, Quat, Vec3};
use vat_common::StaticMesh;

use crate::animation::{GltfClip, TrsProperty};
use crate::bake::{AnimationClip, DeformableMesh};
use crate::error::BakeError;

/// Rest transform and parent of one scene node
#[derive(Debug, Clone, Copy)]
pub struct NodeRest {
    pub parent: Option<usize>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl NodeRest {
    pub fn from_node(node: &gltf::Node, parent: Option<usize>) -> Self {
        let (t, r, s) = node.transform().decomposed();
        Self {
            parent,
            translation: Vec3::from(t),
            rotation: Quat::from_array(r),
            scale: Vec3::from(s),
        }
    }
}

/// A skinned mesh with everything needed to pose it, detached from the
/// glTF document
#[derive(Debug, Clone)]
pub struct GltfSkinnedMesh {
    pub(crate) name: String,
    pub(crate) nodes: Vec<NodeRest>,
    /// Parents before children
    pub(crate) order: Vec<usize>,
    pub(crate) mesh_node: usize,
    pub(crate) joints: Vec<usize>,
    pub(crate) inverse_bind: Vec<Mat4>,
    pub(crate) mesh: StaticMesh,
    pub(crate) vertex_joints: Vec<[u16; 4]>,
    pub(crate) vertex_weights: Vec<[f32; 4]>,
}

impl GltfSkinnedMesh {
    /// Node name, or `node_<index>` when unnamed
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Global matrix of every node with `clip` applied at `time`
    fn pose(&self, clip: &GltfClip, time: f32) -> Result<Vec<Mat4>, BakeError> {
        let mut local: Vec<(Vec3, Quat, Vec3)> = self
            .nodes
            .iter()
            .map(|n| (n.translation, n.rotation, n.scale))
            .collect();

        for track in clip.tracks() {
            let Some(trs) = local.get_mut(track.node) else {
                return Err(BakeError::Configuration(format!(
                    "clip '{}' animates node {} which is not in this scene",
                    clip.name(),
                    track.node
                )));
            };
            let v = track.sample(time);
            match track.property {
                TrsProperty::Translation => trs.0 = Vec3::new(v[0], v[1], v[2]),
                TrsProperty::Rotation => trs.1 = Quat::from_array(v).normalize(),
                TrsProperty::Scale => trs.2 = Vec3::new(v[0], v[1], v[2]),
            }
        }

        let mut global = vec![Mat4::IDENTITY; self.nodes.len()];
        for &index in &self.order {
            let (t, r, s) = local[index];
            let matrix = Mat4::from_scale_rotation_translation(s, r, t);
            global[index] = match self.nodes[index].parent {
                Some(parent) => global[parent] * matrix,
                None => matrix,
            };
        }
        Ok(global)
    }
}

/// Parent-first traversal order of a forest given each node's parent
pub(crate) fn hierarchy_order(nodes: &[NodeRest]) -> Vec<usize> {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut stack = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        match node.parent {
            Some(parent) => children[parent].push(index),
            None => stack.push(index),
        }
    }
    stack.reverse();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(index) = stack.pop() {
        order.push(index);
        stack.extend(children[index].iter().rev());
    }
    order
}

impl DeformableMesh for GltfSkinnedMesh {
    type Clip = GltfClip;

    fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    fn reference_mesh(&self) -> StaticMesh {
        self.mesh.clone()
    }

    fn sample_at(
        &self,
        clip: &GltfClip,
        time: f32,
        out: &mut Vec<[f32; 3]>,
    ) -> Result<(), BakeError> {
        let global = self.pose(clip, time)?;
        let to_mesh = global[self.mesh_node].inverse();
        let joint_matrices: Vec<Mat4> = self
            .joints
            .iter()
            .zip(&self.inverse_bind)
            .map(|(&joint, inverse_bind)| to_mesh * global[joint] * *inverse_bind)
            .collect();

        out.clear();
        out.reserve(self.mesh.positions.len());
        for ((&position, joints), weights) in self
            .mesh
            .positions
            .iter()
            .zip(&self.vertex_joints)
            .zip(&self.vertex_weights)
        {
            let bind = Vec3::from(position);
            let mut skinned = Vec3::ZERO;
            let mut total = 0.0;
            for (&joint, &weight) in joints.iter().zip(weights) {
                if weight > 0.0 {
                    skinned += weight * joint_matrices[joint as usize].transform_point3(bind);
                    total += weight;
                }
            }
            // Unweighted vertices stay in bind pose
            out.push(if total > 0.0 {
                (skinned / total).to_array()
            } else {
                position
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Track;
    use gltf::animation::Interpolation;

    fn rest(parent: Option<usize>, translation: Vec3) -> NodeRest {
        NodeRest {
            parent,
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Node 0: armature, node 1: mesh, node 2: root joint at x=5,
    /// node 3: child joint one unit above the root
    fn two_bone() -> GltfSkinnedMesh {
        let nodes = vec![
            rest(None, Vec3::ZERO),
            rest(Some(0), Vec3::ZERO),
            rest(Some(0), Vec3::new(5.0, 0.0, 0.0)),
            rest(Some(2), Vec3::new(0.0, 1.0, 0.0)),
        ];
        let order = hierarchy_order(&nodes);
        GltfSkinnedMesh {
            name: "Body".to_string(),
            nodes,
            order,
            mesh_node: 1,
            joints: vec![2, 3],
            inverse_bind: vec![
                Mat4::from_translation(Vec3::new(-5.0, 0.0, 0.0)),
                Mat4::from_translation(Vec3::new(-5.0, -1.0, 0.0)),
            ],
            mesh: StaticMesh {
                positions: vec![[0.0, 0.0, 0.0], [0.0, 2.0, 0.0], [1.0, 1.0, 0.0]],
                uvs: None,
                normals: None,
                indices: vec![0, 1, 2],
            },
            vertex_joints: vec![[0, 0, 0, 0], [1, 0, 0, 0], [0, 1, 0, 0]],
            vertex_weights: vec![[1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0]],
        }
    }

    fn lift_child(to: f32) -> GltfClip {
        GltfClip::new(
            "Lift",
            vec![Track {
                node: 3,
                property: TrsProperty::Translation,
                interpolation: Interpolation::Linear,
                times: vec![0.0, 1.0],
                values: vec![[0.0, 1.0, 0.0, 0.0], [0.0, to, 0.0, 0.0]],
            }],
        )
    }

    #[test]
    fn test_hierarchy_order_parents_first() {
        let nodes = vec![
            rest(Some(2), Vec3::ZERO),
            rest(None, Vec3::ZERO),
            rest(Some(1), Vec3::ZERO),
        ];
        assert_eq!(hierarchy_order(&nodes), vec![1, 2, 0]);
        assert_eq!(hierarchy_order(&two_bone().nodes), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_bind_pose_at_rest() {
        let mesh = two_bone();
        let clip = lift_child(1.0);
        let mut out = Vec::new();
        mesh.sample_at(&clip, 0.5, &mut out).unwrap();
        for (a, b) in out.iter().zip(&mesh.mesh.positions) {
            assert!(Vec3::from(*a).abs_diff_eq(Vec3::from(*b), 1e-5));
        }
    }

    #[test]
    fn test_child_joint_moves_its_vertices() {
        let mesh = two_bone();
        let clip = lift_child(3.0);
        let mut out = Vec::new();
        mesh.sample_at(&clip, 1.0, &mut out).unwrap();
        // Root-bound vertex unchanged, child-bound vertex lifted by 2
        assert!(Vec3::from(out[0]).abs_diff_eq(Vec3::ZERO, 1e-5));
        assert!(Vec3::from(out[1]).abs_diff_eq(Vec3::new(0.0, 4.0, 0.0), 1e-5));
        // Zero weights keep the bind position
        assert_eq!(out[2], [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_result_is_in_mesh_node_frame() {
        // Moving the armature that holds mesh and skeleton changes nothing
        let mut mesh = two_bone();
        mesh.nodes[0].translation = Vec3::new(50.0, 0.0, -20.0);
        mesh.nodes[0].rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let mut out = Vec::new();
        mesh.sample_at(&lift_child(3.0), 1.0, &mut out).unwrap();
        assert!(Vec3::from(out[0]).abs_diff_eq(Vec3::ZERO, 1e-4));
        assert!(Vec3::from(out[1]).abs_diff_eq(Vec3::new(0.0, 4.0, 0.0), 1e-4));
    }

    #[test]
    fn test_foreign_clip_is_rejected() {
        let mesh = two_bone();
        let mut tracks = lift_child(1.0).tracks().to_vec();
        tracks[0].node = 9;
        let clip = GltfClip::new("Foreign", tracks);
        let mut out = Vec::new();
        assert!(matches!(
            mesh.sample_at(&clip, 0.0, &mut out),
            Err(BakeError::Configuration(_))
        ));
    }
}
