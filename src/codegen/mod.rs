//! Shader code generation
//!
//! Lowers compiled scene expressions to WGSL. The [`wgsl`] submodule
//! emits expression bodies; this module owns the surrounding plumbing:
//! uniform slot allocation, texture bindings, and the assembled
//! [`ShaderSource`] handed back to the renderer.
//!
//! Author: Moroya Sakamoto

pub mod wgsl;

pub use wgsl::{emit_function, emit_inline, StructRegistry};

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Type of a uniform parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    /// Scalar f32
    Float,
    /// 3-component vector
    Vec3,
    /// Boolean, carried on the GPU as f32 0.0 / 1.0
    Bool,
}

impl ParamType {
    /// WGSL declaration type for this parameter
    ///
    /// Booleans ride as f32 so every uniform stays expressible in the
    /// scalar IR.
    pub fn wgsl(self) -> &'static str {
        match self {
            ParamType::Float | ParamType::Bool => "f32",
            ParamType::Vec3 => "vec3<f32>",
        }
    }
}

/// Value of a node parameter, used as the uniform's default
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Scalar value
    Float(f32),
    /// Vector value
    Vec3([f32; 3]),
    /// Boolean value
    Bool(bool),
}

impl ParamValue {
    /// Type tag for this value
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Float(_) => ParamType::Float,
            ParamValue::Vec3(_) => ParamType::Vec3,
            ParamValue::Bool(_) => ParamType::Bool,
        }
    }

    /// Flat f32 representation, in declaration order
    pub fn to_floats(&self) -> Vec<f32> {
        match self {
            ParamValue::Float(v) => vec![*v],
            ParamValue::Vec3(v) => v.to_vec(),
            ParamValue::Bool(b) => vec![if *b { 1.0 } else { 0.0 }],
        }
    }
}

/// One allocated uniform binding
///
/// `name` is derived from the owning node id and a per-node counter,
/// never from user-entered text, so generated identifiers cannot
/// collide with anything an expression references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformSlot {
    /// Generated WGSL identifier (`u{node}_{idx}`)
    pub name: String,
    /// Id of the node that owns this parameter
    pub node: u64,
    /// Binding index within `@group(0)`
    pub binding: u32,
    /// Parameter type
    pub ty: ParamType,
    /// Value the renderer uploads until the UI overrides it
    pub default: ParamValue,
}

/// Dimensionality of a sampled texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureDim {
    /// 2D texture, sampled at the point's xy
    D2,
    /// 3D texture, sampled at the full point
    D3,
}

impl TextureDim {
    fn wgsl(self) -> &'static str {
        match self {
            TextureDim::D2 => "texture_2d<f32>",
            TextureDim::D3 => "texture_3d<f32>",
        }
    }

    fn sample_coord(self) -> &'static str {
        match self {
            TextureDim::D2 => "p.xy",
            TextureDim::D3 => "p",
        }
    }
}

/// One allocated texture slot: a texture/sampler binding pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureSlot {
    /// Slot id referenced by `TextureSample` expressions
    pub slot: u32,
    /// Id of the node that owns this texture
    pub node: u64,
    /// Texture dimensionality
    pub dim: TextureDim,
    /// Texture binding index within `@group(1)`
    pub texture_binding: u32,
    /// Sampler binding index within `@group(1)`
    pub sampler_binding: u32,
}

/// Serialized allocator for uniform and texture bindings
///
/// One allocator lives for the duration of a scene compile; nodes
/// request slots through it in traversal order, which keeps binding
/// indices deterministic for identical scenes.
#[derive(Debug, Default)]
pub struct UniformAllocator {
    slots: Vec<UniformSlot>,
    textures: Vec<TextureSlot>,
    per_node_count: std::collections::HashMap<u64, u32>,
}

impl UniformAllocator {
    /// Fresh allocator with no bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a uniform slot for a node parameter
    pub fn allocate(&mut self, node: u64, default: ParamValue) -> UniformSlot {
        let idx = self.per_node_count.entry(node).or_insert(0);
        let slot = UniformSlot {
            name: format!("u{}_{}", node, idx),
            node,
            binding: self.slots.len() as u32,
            ty: default.param_type(),
            default,
        };
        *idx += 1;
        self.slots.push(slot.clone());
        slot
    }

    /// Allocate a texture slot (texture + sampler binding pair)
    pub fn allocate_texture(&mut self, node: u64, dim: TextureDim) -> TextureSlot {
        let slot_id = self.textures.len() as u32;
        let slot = TextureSlot {
            slot: slot_id,
            node,
            dim,
            texture_binding: slot_id * 2,
            sampler_binding: slot_id * 2 + 1,
        };
        self.textures.push(slot.clone());
        slot
    }

    /// All uniform slots allocated so far, in binding order
    pub fn slots(&self) -> &[UniformSlot] {
        &self.slots
    }

    /// All texture slots allocated so far, in slot order
    pub fn textures(&self) -> &[TextureSlot] {
        &self.textures
    }

    /// WGSL declarations for every allocated binding
    pub fn declarations(&self) -> String {
        let mut out = String::new();
        for slot in &self.slots {
            writeln!(
                out,
                "@group(0) @binding({}) var<uniform> {}: {};",
                slot.binding,
                slot.name,
                slot.ty.wgsl()
            )
            .unwrap();
        }
        for tex in &self.textures {
            writeln!(
                out,
                "@group(1) @binding({}) var tex{}: {};",
                tex.texture_binding,
                tex.slot,
                tex.dim.wgsl()
            )
            .unwrap();
            writeln!(
                out,
                "@group(1) @binding({}) var samp{}: sampler;",
                tex.sampler_binding, tex.slot
            )
            .unwrap();
        }
        for tex in &self.textures {
            writeln!(
                out,
                "fn texture_sample{slot}(p: vec3<f32>) -> f32 {{\n    return textureSampleLevel(tex{slot}, samp{slot}, {coord}, 0.0).x;\n}}",
                slot = tex.slot,
                coord = tex.dim.sample_coord()
            )
            .unwrap();
        }
        out
    }
}

/// Assembled WGSL shader plus the bindings it expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderSource {
    /// Complete WGSL module text
    pub source: String,
    /// Uniform slots the renderer must bind at `@group(0)`
    pub uniforms: Vec<UniformSlot>,
    /// Texture slots the renderer must bind at `@group(1)`
    pub textures: Vec<TextureSlot>,
}

impl ShaderSource {
    /// Wrap the scene's `map` function into a standalone compute shader
    /// that evaluates distances for a buffer of points
    pub fn to_compute_shader(&self) -> String {
        format!(
            r#"// ALICE-EXPR Generated Compute Shader
// Evaluates the scene distance field at multiple points in parallel

struct InputPoint {{
    x: f32,
    y: f32,
    z: f32,
    _pad: f32,
}}

struct OutputDistance {{
    distance: f32,
    _pad1: f32,
    _pad2: f32,
    _pad3: f32,
}}

@group(2) @binding(0) var<storage, read> input_points: array<InputPoint>;
@group(2) @binding(1) var<storage, read_write> output_distances: array<OutputDistance>;
@group(2) @binding(2) var<uniform> point_count: u32;

{}

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let idx = global_id.x;
    if (idx >= point_count) {{
        return;
    }}

    let point = input_points[idx];
    let p = vec3<f32>(point.x, point.y, point.z);
    output_distances[idx].distance = map(p).distance;
}}
"#,
            self.source
        )
    }
}
