//! glTF/GLB source assets
//!
//! Loads a document once and hands out owned [`GltfSkinnedMesh`] and
//! [`GltfClip`] values for baking.

use std::path::{Path, PathBuf};

use glam::Mat4;
use gltf::mesh::Mode;
use vat_common::StaticMesh;

use crate::animation::GltfClip;
use crate::bake::AnimationClip;
use crate::error::BakeError;
use crate::skin::{GltfSkinnedMesh, NodeRest, hierarchy_order};

/// Summary of one animation, for listing
#[derive(Debug, Clone, PartialEq)]
pub struct ClipInfo {
    pub index: usize,
    pub name: String,
    pub length: f32,
    pub channels: usize,
}

/// Summary of one skinned mesh node, for listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkinnedMeshInfo {
    pub node: usize,
    pub name: String,
    pub vertex_count: usize,
    pub joint_count: usize,
}

pub struct GltfSource {
    path: PathBuf,
    document: gltf::Document,
    buffers: Vec<gltf::buffer::Data>,
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

impl GltfSource {
    pub fn open(path: &Path) -> Result<Self, BakeError> {
        let (document, buffers, _images) = gltf::import(path).map_err(|source| BakeError::Gltf {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            document,
            buffers,
        })
    }

    /// Load a self-contained GLB (or glTF with embedded buffers) from memory
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BakeError> {
        let path = PathBuf::from("<memory>");
        let (document, buffers, _images) =
            gltf::import_slice(bytes).map_err(|source| BakeError::Gltf {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            document,
            buffers,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clips(&self) -> Result<Vec<ClipInfo>, BakeError> {
        self.document
            .animations()
            .map(|animation| {
                let clip = GltfClip::read(&animation, &self.buffers)?;
                Ok(ClipInfo {
                    index: animation.index(),
                    name: clip.name().to_string(),
                    length: clip.length(),
                    channels: animation.channels().count(),
                })
            })
            .collect()
    }

    /// Read an animation by name, or the first one
    pub fn clip(&self, name: Option<&str>) -> Result<GltfClip, BakeError> {
        let animation = match name {
            Some(name) => self
                .document
                .animations()
                .find(|a| a.name() == Some(name))
                .ok_or_else(|| {
                    let available: Vec<_> =
                        self.document.animations().filter_map(|a| a.name()).collect();
                    BakeError::Configuration(format!(
                        "animation '{}' not found in {:?}. Available animations: {:?}",
                        name, self.path, available
                    ))
                })?,
            None => self.document.animations().next().ok_or_else(|| {
                BakeError::Configuration(format!("no animations found in {:?}", self.path))
            })?,
        };
        GltfClip::read(&animation, &self.buffers)
    }

    pub fn skinned_meshes(&self) -> Vec<SkinnedMeshInfo> {
        self.document
            .nodes()
            .filter_map(|node| {
                let mesh = node.mesh()?;
                let skin = node.skin()?;
                let vertex_count = mesh
                    .primitives()
                    .filter(|p| p.mode() == Mode::Triangles)
                    .filter_map(|p| p.get(&gltf::Semantic::Positions))
                    .map(|accessor| accessor.count())
                    .sum();
                Some(SkinnedMeshInfo {
                    node: node.index(),
                    name: node_name(&node),
                    vertex_count,
                    joint_count: skin.joints().count(),
                })
            })
            .collect()
    }

    /// Extract a skinned mesh node by name, or the first skinned one.
    ///
    /// Triangle primitives are concatenated in order; other primitive
    /// modes are skipped.
    pub fn skinned_mesh(&self, name: Option<&str>) -> Result<GltfSkinnedMesh, BakeError> {
        let candidates: Vec<gltf::Node> = self
            .document
            .nodes()
            .filter(|n| n.mesh().is_some())
            .filter(|n| name.is_none() || n.name() == name)
            .collect();
        let Some(first) = candidates.first() else {
            return Err(BakeError::Configuration(match name {
                Some(name) => format!("no mesh node named '{}' in {:?}", name, self.path),
                None => format!("no meshes found in {:?}", self.path),
            }));
        };
        let (node, skin) = candidates
            .iter()
            .find_map(|n| n.skin().map(|skin| (n, skin)))
            .ok_or_else(|| {
                BakeError::UnsupportedMesh(format!(
                    "mesh node '{}' has no skin",
                    node_name(first)
                ))
            })?;
        let name = node_name(node);
        let buffers = &self.buffers;

        let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
        if joints.is_empty() {
            return Err(BakeError::UnsupportedMesh(format!(
                "skin of '{}' has no joints",
                name
            )));
        }
        let inverse_bind: Vec<Mat4> = skin
            .reader(|buffer| Some(&buffers[buffer.index()]))
            .read_inverse_bind_matrices()
            .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
            .unwrap_or_else(|| vec![Mat4::IDENTITY; joints.len()]);
        if inverse_bind.len() != joints.len() {
            return Err(BakeError::UnsupportedMesh(format!(
                "skin of '{}' has {} joints but {} inverse bind matrices",
                name,
                joints.len(),
                inverse_bind.len()
            )));
        }

        let mut mesh = StaticMesh::default();
        let mut uvs: Option<Vec<[f32; 2]>> = Some(Vec::new());
        let mut normals: Option<Vec<[f32; 3]>> = Some(Vec::new());
        let mut vertex_joints: Vec<[u16; 4]> = Vec::new();
        let mut vertex_weights: Vec<[f32; 4]> = Vec::new();

        let gltf_mesh = node
            .mesh()
            .ok_or_else(|| BakeError::UnsupportedMesh(format!("'{}' has no mesh", name)))?;
        for primitive in gltf_mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                tracing::warn!(
                    "Skipping primitive {} of '{}': {:?} is not a triangle list",
                    primitive.index(),
                    name,
                    primitive.mode()
                );
                continue;
            }
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| {
                    BakeError::UnsupportedMesh(format!("'{}' has a primitive without positions", name))
                })?
                .collect();
            let count = positions.len();

            let primitive_joints: Vec<[u16; 4]> = reader
                .read_joints(0)
                .ok_or_else(|| {
                    BakeError::UnsupportedMesh(format!("'{}' has no JOINTS_0 attribute", name))
                })?
                .into_u16()
                .collect();
            let primitive_weights: Vec<[f32; 4]> = reader
                .read_weights(0)
                .ok_or_else(|| {
                    BakeError::UnsupportedMesh(format!("'{}' has no WEIGHTS_0 attribute", name))
                })?
                .into_f32()
                .collect();
            if primitive_joints.len() != count || primitive_weights.len() != count {
                return Err(BakeError::UnsupportedMesh(format!(
                    "'{}': {} positions, {} joints, {} weights",
                    name,
                    count,
                    primitive_joints.len(),
                    primitive_weights.len()
                )));
            }
            if let Some(bad) = primitive_joints
                .iter()
                .flatten()
                .find(|&&j| j as usize >= joints.len())
            {
                return Err(BakeError::UnsupportedMesh(format!(
                    "'{}' references joint {} of a {}-joint skin",
                    name,
                    bad,
                    joints.len()
                )));
            }

            let base = u32::try_from(mesh.positions.len()).map_err(|_| {
                BakeError::Configuration(format!("'{}' has too many vertices", name))
            })?;
            match reader.read_indices() {
                Some(indices) => mesh
                    .indices
                    .extend(indices.into_u32().map(|index| base + index)),
                None => mesh.indices.extend((0..count as u32).map(|i| base + i)),
            }

            // Keep an attribute only if every primitive has it
            uvs = uvs.zip(reader.read_tex_coords(0)).map(|(mut all, read)| {
                all.extend(read.into_f32());
                all
            });
            normals = normals.zip(reader.read_normals()).map(|(mut all, read)| {
                all.extend(read);
                all
            });

            mesh.positions.extend(positions);
            vertex_joints.extend(primitive_joints);
            vertex_weights.extend(primitive_weights);
        }

        if mesh.positions.is_empty() {
            return Err(BakeError::UnsupportedMesh(format!(
                "'{}' has no triangle primitives",
                name
            )));
        }
        mesh.uvs = uvs.filter(|uvs| uvs.len() == mesh.positions.len());
        mesh.normals = normals.filter(|normals| normals.len() == mesh.positions.len());

        let mut parents = vec![None; self.document.nodes().count()];
        for parent in self.document.nodes() {
            for child in parent.children() {
                parents[child.index()] = Some(parent.index());
            }
        }
        let nodes: Vec<NodeRest> = self
            .document
            .nodes()
            .map(|n| NodeRest::from_node(&n, parents[n.index()]))
            .collect();
        let order = hierarchy_order(&nodes);

        tracing::debug!(
            "Loaded skinned mesh '{}': {} vertices, {} indices, {} joints",
            name,
            mesh.positions.len(),
            mesh.indices.len(),
            joints.len()
        );

        Ok(GltfSkinnedMesh {
            name,
            nodes,
            order,
            mesh_node: node.index(),
            joints,
            inverse_bind,
            mesh,
            vertex_joints,
            vertex_weights,
        })
    }
}
