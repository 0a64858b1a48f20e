use ahash::AHashMap;
use tracing::{debug, info};

mod emitter;
mod grouping;
mod security;

pub use emitter::{BackendEmitter, ContextEmitter, FrontendEmitter, HybridEmitter};
pub use grouping::{infer_domain, CodegenUnit};
pub use security::{SecurityPipeline, SecurityStage};

use crate::constraint::{ConstraintSet, ValidationResult};
use crate::error::CodegenError;
use crate::graph::{ExecutionContext, Graph};
use crate::types::{TypeDescriptor, TypeTranslator};

/// One generated source unit. The core never writes files; the path hint
/// tells the caller where the unit belongs if it chooses to persist it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub path_hint: String,
    pub content: String,
    pub dependencies: Vec<String>,
}

/// Descriptors for every node of a unit, keyed by node id then port/property
/// name.
pub type UnitDescriptors = AHashMap<String, AHashMap<String, TypeDescriptor>>;

/// Drives per-node code generation across execution contexts.
///
/// Emitters are registered per context, mirroring how node parsers register
/// per operation type: a context with no emitter is a fatal configuration
/// error, never a silent skip.
pub struct CodeGenerator {
    constraints: ConstraintSet,
    registry: AHashMap<ExecutionContext, Box<dyn ContextEmitter>>,
}

pub struct CodeGeneratorBuilder {
    constraints: ConstraintSet,
    registry: AHashMap<ExecutionContext, Box<dyn ContextEmitter>>,
}

impl CodeGeneratorBuilder {
    pub fn new(constraints: ConstraintSet) -> Self {
        let mut registry: AHashMap<ExecutionContext, Box<dyn ContextEmitter>> = AHashMap::new();
        registry.insert(ExecutionContext::Frontend, Box::new(FrontendEmitter));
        registry.insert(ExecutionContext::Backend, Box::new(BackendEmitter));
        registry.insert(ExecutionContext::Hybrid, Box::new(HybridEmitter));
        Self {
            constraints,
            registry,
        }
    }

    /// A builder with no emitters registered at all, for embedders that
    /// replace the whole emission stack.
    pub fn bare(constraints: ConstraintSet) -> Self {
        Self {
            constraints,
            registry: AHashMap::new(),
        }
    }

    /// Replaces or adds the emitter for a context.
    pub fn with_emitter(mut self, emitter: Box<dyn ContextEmitter>) -> Self {
        self.registry.insert(emitter.context(), emitter);
        self
    }

    pub fn build(self) -> CodeGenerator {
        CodeGenerator {
            constraints: self.constraints,
            registry: self.registry,
        }
    }
}

impl CodeGenerator {
    pub fn builder(constraints: ConstraintSet) -> CodeGeneratorBuilder {
        CodeGeneratorBuilder::new(constraints)
    }

    /// Generates typed source units for every node of a validated graph.
    ///
    /// Refuses outright on an invalid graph or a context without a
    /// registered emitter; there is no partial output.
    pub fn generate(
        &self,
        graph: &Graph,
        validation: &ValidationResult,
    ) -> Result<Vec<GeneratedArtifact>, CodegenError> {
        if !validation.is_valid {
            return Err(CodegenError::InvalidGraph {
                error_count: validation.error_count(),
            });
        }
        for node in &graph.nodes {
            if !self.registry.contains_key(&node.execution_context) {
                return Err(CodegenError::MissingEmitter {
                    context: node.execution_context,
                    node_id: node.id.clone(),
                });
            }
        }

        let mut translator = TypeTranslator::new();
        let mut descriptors: UnitDescriptors = AHashMap::new();
        for node in &graph.nodes {
            let selected = self.constraints.for_node_type(node.node_type);
            descriptors.insert(node.id.clone(), translator.translate(node, &selected));
        }

        let units = grouping::coalesce(graph);
        debug!(graph = %graph.id, units = units.len(), "codegen units grouped");

        let mut artifacts = Vec::new();
        for unit in &units {
            let emitter = self.registry.get(&unit.context).ok_or_else(|| {
                CodegenError::MissingEmitter {
                    context: unit.context,
                    node_id: unit.nodes.first().map(|n| n.id.clone()).unwrap_or_default(),
                }
            })?;
            artifacts.extend(emitter.emit(unit, &descriptors)?);
        }
        artifacts.sort_by(|a, b| a.path_hint.cmp(&b.path_hint));

        info!(
            graph = %graph.id,
            artifacts = artifacts.len(),
            "code generation finished"
        );
        Ok(artifacts)
    }
}
