//! GLTF JSON structure building.

use super::binary_packing::PackedData;
use super::mesh_data::AnimationData;
use gltf_json as json;
use json::validation::Checked::Valid;
use std::collections::BTreeMap;

// Node indices
const ROOT_NODE: u32 = 0;
const MESH_NODE: u32 = 1;

fn node(name: &str, mesh: Option<u32>, skin: Option<u32>) -> json::Node {
    json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: mesh.map(json::Index::new),
        name: Some(name.to_string()),
        rotation: None,
        scale: None,
        translation: None,
        skin: skin.map(json::Index::new),
        weights: None,
    }
}

fn primitive(
    attributes: BTreeMap<json::validation::Checked<json::mesh::Semantic>, json::Index<json::Accessor>>,
    indices: Option<u32>,
    mode: json::mesh::Mode,
) -> json::mesh::Primitive {
    json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices: indices.map(json::Index::new),
        material: None,
        mode: Valid(mode),
        targets: None,
    }
}

/// Build the GLTF JSON structure.
///
/// Node 0 is the root joint (animated by every clip), node 1 the mesh.
/// Unskinned variants keep node 0 as a plain animated node.
pub(crate) fn build_gltf_json(
    packed: &PackedData,
    animations: &[AnimationData],
    skinned: bool,
) -> json::Root {
    let nodes = vec![
        node("Root", None, None),
        node("Body", Some(0), skinned.then_some(0)),
    ];

    let mut attributes = BTreeMap::new();
    attributes.insert(
        Valid(json::mesh::Semantic::Positions),
        json::Index::new(packed.position),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::Normals),
        json::Index::new(packed.normal),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::TexCoords(0)),
        json::Index::new(packed.uv),
    );
    if skinned {
        attributes.insert(
            Valid(json::mesh::Semantic::Joints(0)),
            json::Index::new(packed.joints),
        );
        attributes.insert(
            Valid(json::mesh::Semantic::Weights(0)),
            json::Index::new(packed.weights),
        );
    }

    // A point cloud over the same vertices, which bakers skip
    let mut point_attributes = BTreeMap::new();
    point_attributes.insert(
        Valid(json::mesh::Semantic::Positions),
        json::Index::new(packed.position),
    );

    let meshes = vec![json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("Quad".to_string()),
        primitives: vec![
            primitive(attributes, Some(packed.indices), json::mesh::Mode::Triangles),
            primitive(point_attributes, None, json::mesh::Mode::Points),
        ],
        weights: None,
    }];

    let skins = if skinned {
        vec![json::Skin {
            extensions: Default::default(),
            extras: Default::default(),
            inverse_bind_matrices: Some(json::Index::new(packed.inverse_bind)),
            joints: vec![json::Index::new(ROOT_NODE)],
            name: Some("Skeleton".to_string()),
            skeleton: Some(json::Index::new(ROOT_NODE)),
        }]
    } else {
        Vec::new()
    };

    // One translation channel on the root per clip
    let animations = animations
        .iter()
        .zip(&packed.animations)
        .map(|(animation, &(times, translations))| json::Animation {
            channels: vec![json::animation::Channel {
                sampler: json::Index::new(0),
                target: json::animation::Target {
                    node: json::Index::new(ROOT_NODE),
                    path: Valid(json::animation::Property::Translation),
                    extensions: Default::default(),
                    extras: Default::default(),
                },
                extensions: Default::default(),
                extras: Default::default(),
            }],
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(animation.name.to_string()),
            samplers: vec![json::animation::Sampler {
                input: json::Index::new(times),
                interpolation: Valid(json::animation::Interpolation::Linear),
                output: json::Index::new(translations),
                extensions: Default::default(),
                extras: Default::default(),
            }],
        })
        .collect();

    let scenes = vec![json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("TestScene".to_string()),
        nodes: vec![json::Index::new(ROOT_NODE), json::Index::new(MESH_NODE)],
    }];

    // Byte length is set by assemble_glb
    let buffers = vec![json::Buffer {
        byte_length: 0u64.into(),
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        uri: None,
    }];

    json::Root {
        accessors: packed.accessors.clone(),
        animations,
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some("vat-export-test".to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers,
        buffer_views: packed.views.clone(),
        cameras: Vec::new(),
        extensions: Default::default(),
        extras: Default::default(),
        extensions_required: Vec::new(),
        extensions_used: Vec::new(),
        images: Vec::new(),
        materials: Vec::new(),
        meshes,
        nodes,
        samplers: Vec::new(),
        scene: Some(json::Index::new(0)),
        scenes,
        skins,
        textures: Vec::new(),
    }
}
