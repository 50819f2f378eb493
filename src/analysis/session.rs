use crate::analysis::call_graph::{self, CallGraph, Recursion, TypeHierarchy};
use crate::analysis::context::{AnalysisConfig, CancellationToken};
use crate::analysis::control_flow::{
    self, ControlFlowGraph, DominatorAnalysis, LivenessResult, ReachingDefsResult,
};
use crate::analysis::dependencies::{self, DependencyGraph, DependencyLevel};
use crate::analysis::identity;
use crate::analysis::index::{
    MemberIndex, NamespaceListing, TypeDetail, TypeIndex, browse_namespace, type_detail,
};
use crate::analysis::obfuscation::{self, ObfuscationResult};
use crate::analysis::patterns::{self, DetectedPattern};
use crate::analysis::search::{self, SearchRequest, SearchResponse};
use crate::analysis::xref::{self, CrossReference};
use crate::errors::{AnalysisError, AnalysisResult};
use crate::model::{MethodBody, Module};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Type-safe, thread-safe artifact store keyed by TypeId. Values are stored
/// as `Arc<T>` and shared out by clone.
#[derive(Default)]
pub struct ArtifactStore {
    inner: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_arc<T: Any + Send + Sync>(&self, value: Arc<T>) {
        let mut map = self.inner.write().expect("artifact store poisoned");
        map.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let map = self.inner.read().ok()?;
        let any = map.get(&TypeId::of::<T>())?;
        any.downcast_ref::<Arc<T>>().cloned()
    }
}

/// Per-module analysis session: the shared immutable Module Model, the
/// config, and lazily built shared artifacts (indexes, type hierarchy).
/// Every exposed operation is pure over the model; a rewriting collaborator
/// must discard the session and start a new one.
pub struct AnalysisSession {
    module: Arc<Module>,
    pub config: AnalysisConfig,
    artifacts: ArtifactStore,
}

impl AnalysisSession {
    pub fn new(module: Module) -> Self {
        Self::with_config(module, AnalysisConfig::default())
    }

    pub fn with_config(module: Module, config: AnalysisConfig) -> Self {
        Self {
            module: Arc::new(module),
            config,
            artifacts: ArtifactStore::new(),
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    fn cached<T, F>(&self, build: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce(&Module) -> T,
    {
        if let Some(existing) = self.artifacts.get::<T>() {
            return existing;
        }
        let built = Arc::new(build(&self.module));
        self.artifacts.insert_arc(built.clone());
        built
    }

    /// Built once per session, shared afterwards.
    pub fn type_index(&self) -> Arc<TypeIndex> {
        self.cached(TypeIndex::build)
    }

    pub fn member_index(&self) -> Arc<MemberIndex> {
        self.cached(MemberIndex::build)
    }

    pub fn hierarchy(&self) -> Arc<TypeHierarchy> {
        self.cached(TypeHierarchy::build)
    }

    pub fn get_type_detail(&self, type_id: &str) -> AnalysisResult<TypeDetail> {
        type_detail(&self.type_index(), &self.member_index(), type_id)
            .ok_or_else(|| AnalysisError::NotFound(type_id.to_string()))
    }

    pub fn browse_namespace(&self, ns: &str) -> NamespaceListing {
        browse_namespace(&self.type_index(), ns)
    }

    /// CFG for one method, addressed by type and method name.
    pub fn build_cfg(&self, type_name: &str, method_name: &str) -> AnalysisResult<ControlFlowGraph> {
        let t = self
            .module
            .find_type(type_name)
            .ok_or_else(|| AnalysisError::NotFound(type_name.to_string()))?;
        let method = t
            .find_method(method_name)
            .ok_or_else(|| AnalysisError::NotFound(format!("{type_name}.{method_name}")))?;
        let id = identity::method_id(&self.module, method);
        control_flow::build(method, id)
    }

    /// Body of one method, for the data-flow entry points.
    pub fn method_body(&self, type_name: &str, method_name: &str) -> AnalysisResult<&MethodBody> {
        let method = self
            .module
            .find_method(type_name, method_name)
            .ok_or_else(|| AnalysisError::NotFound(format!("{type_name}.{method_name}")))?;
        method
            .body
            .as_ref()
            .ok_or_else(|| AnalysisError::NoBody(method.full_name.clone()))
    }

    pub fn analyze_dominators(&self, cfg: &ControlFlowGraph) -> DominatorAnalysis {
        control_flow::analyze_dominators(cfg)
    }

    pub fn analyze_liveness(&self, cfg: &ControlFlowGraph, body: &MethodBody) -> LivenessResult {
        control_flow::analyze_liveness(cfg, body)
    }

    pub fn analyze_reaching_defs(
        &self,
        cfg: &ControlFlowGraph,
        body: &MethodBody,
    ) -> ReachingDefsResult {
        control_flow::analyze_reaching_defs(cfg, body)
    }

    pub fn build_call_graph(&self, cancel: &CancellationToken) -> AnalysisResult<CallGraph> {
        call_graph::build(&self.module, &self.hierarchy(), &self.config, cancel)
    }

    pub fn detect_recursion(&self, graph: &CallGraph) -> Vec<Recursion> {
        call_graph::detect_recursion(graph)
    }

    pub fn find_references_to_type(
        &self,
        type_name: &str,
        cancel: &CancellationToken,
    ) -> AnalysisResult<Vec<CrossReference>> {
        xref::find_references_to_type(&self.module, type_name, cancel)
    }

    pub fn find_calls_to_method(
        &self,
        type_name: &str,
        method_name: &str,
        cancel: &CancellationToken,
    ) -> AnalysisResult<Vec<CrossReference>> {
        xref::find_calls_to_method(&self.module, type_name, method_name, cancel)
    }

    pub fn find_field_usages(
        &self,
        type_name: &str,
        field_name: &str,
        cancel: &CancellationToken,
    ) -> AnalysisResult<Vec<CrossReference>> {
        xref::find_field_usages(&self.module, type_name, field_name, cancel)
    }

    pub fn find_method_overrides(
        &self,
        type_name: &str,
        method_name: &str,
        cancel: &CancellationToken,
    ) -> AnalysisResult<Vec<CrossReference>> {
        xref::find_method_overrides(&self.module, &self.hierarchy(), type_name, method_name, cancel)
    }

    pub fn find_interface_impls(
        &self,
        iface_name: &str,
        method_name: &str,
        cancel: &CancellationToken,
    ) -> AnalysisResult<Vec<CrossReference>> {
        xref::find_interface_impls(&self.module, iface_name, method_name, cancel)
    }

    pub fn build_dependency_graph(
        &self,
        level: DependencyLevel,
        root_type: Option<&str>,
        max_depth: Option<usize>,
        cancel: &CancellationToken,
    ) -> AnalysisResult<DependencyGraph> {
        dependencies::build(&self.module, &self.config, level, root_type, max_depth, cancel)
    }

    pub fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> AnalysisResult<SearchResponse> {
        search::search(&self.module, &self.config, request, cancel)
    }

    pub fn detect_patterns(
        &self,
        type_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> AnalysisResult<Vec<DetectedPattern>> {
        patterns::detect_patterns(&self.module, &self.hierarchy(), type_name, cancel)
    }

    pub fn detect_obfuscation(
        &self,
        cancel: &CancellationToken,
    ) -> AnalysisResult<ObfuscationResult> {
        obfuscation::detect_obfuscation(&self.module, &self.config, cancel)
    }
}
