//! GLB container writing.

use super::binary_packing::pad_to_four;
use gltf_json as json;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// Append one chunk: length, type, then the payload padded with `fill`
fn push_chunk(glb: &mut Vec<u8>, kind: u32, payload: &[u8], fill: u8) {
    let mut data = payload.to_vec();
    pad_to_four(&mut data, fill);
    glb.extend_from_slice(&(data.len() as u32).to_le_bytes());
    glb.extend_from_slice(&kind.to_le_bytes());
    glb.extend_from_slice(&data);
}

/// Wrap `root` and its single binary buffer into a GLB file
pub(crate) fn assemble_glb(root: &json::Root, buffer_data: &[u8]) -> Vec<u8> {
    let mut root = root.clone();
    root.buffers[0].byte_length = buffer_data.len().into();
    let text = json::serialize::to_vec(&root).expect("Failed to serialize glTF JSON");

    let mut body = Vec::new();
    push_chunk(&mut body, CHUNK_JSON, &text, b' ');
    push_chunk(&mut body, CHUNK_BIN, buffer_data, 0);

    let mut glb = Vec::with_capacity(12 + body.len());
    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&((12 + body.len()) as u32).to_le_bytes());
    glb.extend_from_slice(&body);
    glb
}
