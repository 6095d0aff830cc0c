//! # Weave Compiler (native)
//!
//! Convention compiler for component directories, plus the lifecycle runtime
//! the generated wrappers call into.
//!
//! ## Compile stage
//!
//! 1. **Discovery**: `scan(root)` walks the components root. A directory with an
//!    `index.tsx`/`index.jsx` view and at least one concern file, skin or route
//!    becomes a `ComponentDescriptor`. Bracketed directories (`[routes]`,
//!    `[posts]`) are never components themselves.
//!
//! 2. **Export extraction**: `export_names(path)` parses a concern file with oxc
//!    and lists its named value exports. Unreadable or unparseable files yield
//!    an empty list.
//!
//! 3. **Synthesis**: `synthesize(descriptor, prefix, project_root)` emits the
//!    wrapper module. Composition order is fixed:
//!    `ErrorBoundary > Suspense > Themed > HookCore > LazyView`.
//!
//! 4. **Hygiene**: every identifier the wrapper introduces is
//!    `prefix + suffix`, so nothing collides with user names.
//!
//! ## Runtime
//!
//! `runtime` holds the latency state machine, the staleness guard that drops
//! superseded settlements, and the binding handler built on both.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod codegen;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod exports;
pub mod hygiene;
pub mod options;
pub mod plugin;
pub mod runtime;

#[cfg(test)]
mod discovery_tests;

pub use codegen::{synthesize, synthesize_all, synthesize_with_options, CompositionPlan};
pub use descriptor::{display_name, resolve_route_path, ComponentDescriptor, ConcernKind, RouteNode};
pub use discovery::{find_concern, scan};
pub use error::{CompilerError, CompilerResult, RuntimeError};
pub use exports::{export_names, export_names_from_source};
pub use hygiene::HygienePrefix;
pub use options::SynthesisOptions;
pub use plugin::{ComponentRegistry, VIRTUAL_PREFIX};

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
fn descriptor_from_json(value: serde_json::Value) -> CompilerResult<ComponentDescriptor> {
    serde_json::from_value(value).map_err(|e| CompilerError::Descriptor(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn scan_components_native(components_root: String) -> napi::Result<serde_json::Value> {
    let components = scan(std::path::Path::new(&components_root));
    serde_json::to_value(components).map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn synthesize_component_native(
    descriptor: serde_json::Value,
    project_root: String,
    prefix: Option<String>,
    options: Option<serde_json::Value>,
) -> napi::Result<String> {
    let descriptor = descriptor_from_json(descriptor).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let prefix = match prefix {
        Some(token) => HygienePrefix::new(token).map_err(|e| napi::Error::from_reason(e.to_string()))?,
        None => HygienePrefix::generate(),
    };
    let options: SynthesisOptions = match options {
        Some(value) => serde_json::from_value(value).map_err(|e| napi::Error::from_reason(e.to_string()))?,
        None => SynthesisOptions::default(),
    };
    Ok(synthesize_with_options(
        &descriptor,
        &prefix,
        std::path::Path::new(&project_root),
        &options,
    ))
}

#[cfg(feature = "napi")]
#[napi]
pub fn export_names_native(file_path: String) -> Vec<String> {
    export_names(std::path::Path::new(&file_path))
}
