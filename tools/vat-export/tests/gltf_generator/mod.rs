//! Programmatic GLB generation for integration tests.
//!
//! Generates a complete GLB file with:
//! - Skinned quad (positions, normals, UVs, joints, weights, indices)
//! - 1-joint skeleton with an identity inverse bind matrix
//! - "Rise" (2 s, root translates 0 → 1 in Y) and "Hop" (1 s) animations

#![allow(dead_code)]

mod binary_packing;
mod glb_assembly;
mod gltf_json;
mod mesh_data;

pub use mesh_data::{QUAD_VERTEX_COUNT, RISE_HEIGHT, RISE_LENGTH};

use mesh_data::{create_animations, create_mesh_data};

/// Generate a skinned quad GLB for testing.
///
/// The mesh has a second, point-mode primitive that a baker must skip.
pub fn generate_skinned_glb() -> Vec<u8> {
    build(true)
}

/// Same quad and animations, but the mesh node has no skin and the
/// primitive no JOINTS_0/WEIGHTS_0
pub fn generate_unskinned_glb() -> Vec<u8> {
    build(false)
}

fn build(skinned: bool) -> Vec<u8> {
    let mesh = create_mesh_data();
    let animations = create_animations();

    let packed = binary_packing::pack_binary_data(&mesh, &animations);
    let root = gltf_json::build_gltf_json(&packed, &animations, skinned);

    glb_assembly::assemble_glb(&root, &packed.buffer)
}
