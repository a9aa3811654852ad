//! Scene graph compilation
//!
//! Walks a tree of [`SceneNode`] collaborators and lowers each node to
//! one WGSL function `node{id}(p)` returning that node's surface
//! struct. Children compile before parents; a parent sees each child
//! only as a typed call placeholder, so node implementations stay
//! decoupled from each other's internals.
//!
//! A node that fails to produce a usable expression does not abort the
//! compile: it degrades to an empty surface (constant distance 1e9)
//! and the failure is reported through `tracing`, so one broken
//! formula in the editor never blanks the whole viewport.
//!
//! Author: Moroya Sakamoto

use crate::codegen::{
    emit_function, ParamType, ParamValue, ShaderSource, StructRegistry, TextureDim,
    UniformAllocator, UniformSlot,
};
use crate::expr::{Expr, ExprType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use thiserror::Error;
use tracing::warn;

/// Distance assigned to a surface that failed to compile; far enough
/// that ray marchers treat it as empty space
pub const EMPTY_SURFACE_DISTANCE: f32 = 1e9;

/// Stable identifier of a scene node
///
/// Ids are assigned by the editor and never reused within a scene's
/// lifetime, so generated names keyed on them stay stable across
/// recompiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hand-written WGSL contributed by a node instead of an expression
///
/// `source` must define a function `fn {function_name}(p: vec3<f32>)
/// -> f32` returning a distance. It is spliced into the shader
/// verbatim; the compiler wraps the call into the node's surface
/// struct so parents consume raw and expression nodes identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFragment {
    /// Name of the distance function defined by `source`
    pub function_name: String,
    /// Complete WGSL text of the fragment
    pub source: String,
}

/// Errors that abort a scene compile outright
///
/// Per-node failures degrade instead; only structural problems with
/// the graph itself surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Two distinct nodes carry the same id
    #[error("duplicate node id {id} in scene graph")]
    DuplicateNodeId {
        /// The repeated id
        id: NodeId,
    },

    /// The graph reaches a node from inside its own subtree
    #[error("cycle through node {id} in scene graph")]
    Cycle {
        /// A node on the cycle
        id: NodeId,
    },
}

/// Errors a node may raise while building its expression
pub type NodeError = Box<dyn std::error::Error + Send + Sync>;

/// Per-node compilation context handed to [`SceneNode::expression`]
///
/// Provides the position binding, typed placeholders for already
/// compiled children, and access to the compile-wide uniform
/// allocator.
pub struct NodeContext<'a> {
    node: NodeId,
    children: Vec<Expr>,
    params: Vec<Expr>,
    allocator: &'a mut UniformAllocator,
}

/// The expression reading an allocated uniform slot
fn uniform_expr(slot: &UniformSlot) -> Expr {
    let ty = match slot.ty {
        ParamType::Float | ParamType::Bool => ExprType::Float,
        ParamType::Vec3 => ExprType::Vec3,
    };
    Expr::var(slot.name.clone(), ty)
}

impl<'a> NodeContext<'a> {
    /// The evaluation point, a `vec3` variable named `p`
    pub fn position(&self) -> Expr {
        Expr::point_var("p")
    }

    /// Number of compiled children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Surface expression of the i-th child
    ///
    /// Struct-typed; the `distance` field is always present.
    pub fn child(&self, index: usize) -> Option<Expr> {
        self.children.get(index).cloned()
    }

    /// Uniform expression for the i-th declared parameter, in
    /// [`SceneNode::parameters`] order
    pub fn param(&self, index: usize) -> Option<Expr> {
        self.params.get(index).cloned()
    }

    /// Allocate an ad-hoc uniform and return the expression reading it
    ///
    /// The renderer uploads `default` until the UI overrides it. Bools
    /// ride as f32 0/1 and read back as a scalar expression.
    pub fn uniform(&mut self, default: ParamValue) -> Expr {
        let slot = self.allocator.allocate(self.node.0, default);
        uniform_expr(&slot)
    }

    /// Allocate a texture slot; sample it via [`Expr::texture_sample`]
    pub fn texture(&mut self, dim: TextureDim) -> u32 {
        self.allocator.allocate_texture(self.node.0, dim).slot
    }
}

/// A compilable node in the editor's scene graph
///
/// Implementations provide at least one of [`expression`] or
/// [`raw_fragment`]; when both are present the raw fragment wins.
/// A node providing neither (or whose expression fails) compiles to
/// the empty surface.
///
/// [`expression`]: SceneNode::expression
/// [`raw_fragment`]: SceneNode::raw_fragment
pub trait SceneNode {
    /// Stable id of this node
    fn id(&self) -> NodeId;

    /// Upper bound on accepted children, `None` for unlimited
    fn max_children(&self) -> Option<usize> {
        None
    }

    /// Declared parameters, in order
    ///
    /// Each gets a uniform slot allocated before [`expression`] runs,
    /// readable through [`NodeContext::param`].
    ///
    /// [`expression`]: SceneNode::expression
    fn parameters(&self) -> Vec<ParamValue> {
        Vec::new()
    }

    /// Child nodes, in input order
    fn children(&self) -> Vec<&dyn SceneNode> {
        Vec::new()
    }

    /// Build this node's surface expression
    ///
    /// Returns `None` when the node has no expression capability.
    /// The result may be a bare scalar distance or a surface struct
    /// with a scalar `distance` field.
    fn expression(&self, _ctx: &mut NodeContext<'_>) -> Option<Result<Expr, NodeError>> {
        None
    }

    /// Hand-written WGSL for this node, if it provides any
    fn raw_fragment(&self) -> Option<RawFragment> {
        None
    }
}

/// The surface substituted for a node that failed to compile
pub fn empty_surface() -> Expr {
    // structure() cannot fail for a single scalar field
    match Expr::structure(vec![(
        "distance".to_string(),
        Expr::constant(EMPTY_SURFACE_DISTANCE),
    )]) {
        Ok(e) => e,
        Err(_) => unreachable!(),
    }
}

struct Compiler {
    allocator: UniformAllocator,
    registry: StructRegistry,
    functions: Vec<String>,
    fragments: Vec<String>,
    // id -> (call text, surface type) for compiled nodes
    compiled: HashMap<NodeId, (String, ExprType)>,
    // id -> node address, to tell shared nodes from id collisions
    identity: HashMap<NodeId, usize>,
    in_progress: HashSet<NodeId>,
}

impl Compiler {
    fn new() -> Self {
        Compiler {
            allocator: UniformAllocator::new(),
            registry: StructRegistry::new(),
            functions: Vec::new(),
            fragments: Vec::new(),
            compiled: HashMap::new(),
            identity: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Compile one node (children first) and return the placeholder
    /// expression parents use to reference it
    fn compile_node(&mut self, node: &dyn SceneNode) -> Result<Expr, CompileError> {
        let id = node.id();
        let addr = node as *const dyn SceneNode as *const () as usize;
        match self.identity.get(&id) {
            Some(&seen) if seen != addr => return Err(CompileError::DuplicateNodeId { id }),
            Some(_) => {
                // shared subtree, already compiled or on the stack
                if self.in_progress.contains(&id) {
                    return Err(CompileError::Cycle { id });
                }
                if let Some((call, ty)) = self.compiled.get(&id) {
                    return Ok(Expr::var(call.clone(), ty.clone()));
                }
            }
            None => {
                self.identity.insert(id, addr);
            }
        }

        self.in_progress.insert(id);
        let mut children = Vec::new();
        for child in node.children() {
            children.push(self.compile_node(child)?);
        }
        self.in_progress.remove(&id);

        let surface = self.node_surface(node, id, children);
        let fn_name = format!("node{}", id);
        let surface_ty = surface.ty();
        self.functions
            .push(emit_function(&fn_name, &surface, &mut self.registry));

        let call = format!("{}(p)", fn_name);
        self.compiled.insert(id, (call.clone(), surface_ty.clone()));
        Ok(Expr::var(call, surface_ty))
    }

    /// The node's surface expression, degraded to the empty surface on
    /// any per-node failure
    fn node_surface(&mut self, node: &dyn SceneNode, id: NodeId, children: Vec<Expr>) -> Expr {
        if let Some(max) = node.max_children() {
            if children.len() > max {
                warn!(
                    node = %id,
                    children = children.len(),
                    max,
                    "node exceeds its child limit, substituting empty surface"
                );
                return empty_surface();
            }
        }

        if let Some(fragment) = node.raw_fragment() {
            let call = format!("{}(p)", fragment.function_name);
            self.fragments.push(fragment.source);
            let distance = Expr::var(call, ExprType::Float);
            return match Expr::structure(vec![("distance".to_string(), distance)]) {
                Ok(e) => e,
                Err(_) => unreachable!(),
            };
        }

        let params: Vec<Expr> = node
            .parameters()
            .into_iter()
            .map(|default| uniform_expr(&self.allocator.allocate(id.0, default)))
            .collect();
        let mut ctx = NodeContext {
            node: id,
            children,
            params,
            allocator: &mut self.allocator,
        };
        match node.expression(&mut ctx) {
            Some(Ok(expr)) => match expr.ty() {
                ExprType::Float => match Expr::structure(vec![("distance".to_string(), expr)]) {
                    Ok(e) => e,
                    Err(_) => unreachable!(),
                },
                ExprType::Struct(_) if expr.has_distance_field() => expr,
                other => {
                    warn!(
                        node = %id,
                        ty = %other,
                        "node expression has no scalar distance field, substituting empty surface"
                    );
                    empty_surface()
                }
            },
            Some(Err(error)) => {
                warn!(
                    node = %id,
                    error = %error,
                    "node failed to compile, substituting empty surface"
                );
                empty_surface()
            }
            None => {
                warn!(
                    node = %id,
                    "node provides neither expression nor raw fragment, substituting empty surface"
                );
                empty_surface()
            }
        }
    }

    /// Assemble the full shader module in a fixed section order:
    /// structs, raw fragments, bindings, node functions, `map`
    fn assemble(mut self, root_call: &str, root_ty: &ExprType) -> ShaderSource {
        let mut source = String::new();
        source.push_str("// Generated by alice-expr\n\n");

        let structs = self.registry.declarations();
        if !structs.is_empty() {
            source.push_str(&structs);
            source.push('\n');
        }
        for fragment in &self.fragments {
            source.push_str(fragment);
            if !fragment.ends_with('\n') {
                source.push('\n');
            }
            source.push('\n');
        }
        let bindings = self.allocator.declarations();
        if !bindings.is_empty() {
            source.push_str(&bindings);
            source.push('\n');
        }
        for function in &self.functions {
            source.push_str(function);
            source.push('\n');
        }

        let ret_ty = self.registry.wgsl_type(root_ty);
        writeln!(
            source,
            "fn map(p: vec3<f32>) -> {} {{\n    return {};\n}}",
            ret_ty, root_call
        )
        .unwrap();

        ShaderSource {
            source,
            uniforms: self.allocator.slots().to_vec(),
            textures: self.allocator.textures().to_vec(),
        }
    }
}

/// Compile a scene graph to a WGSL shader
///
/// The returned shader defines `fn map(p: vec3<f32>)` returning the
/// root node's surface struct. Output is byte-identical for identical
/// scenes.
pub fn compile_scene(root: &dyn SceneNode) -> Result<ShaderSource, CompileError> {
    let mut compiler = Compiler::new();
    let placeholder = compiler.compile_node(root)?;
    let (call, ty) = match &placeholder {
        Expr::Var { name, ty } => (name.clone(), ty.clone()),
        _ => unreachable!(),
    };
    Ok(compiler.assemble(&call, &ty))
}
