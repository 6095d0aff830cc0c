use serde::{Deserialize, Serialize};

/// Module specifiers and switches the synthesizer emits against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthesisOptions {
    pub runtime_module: String,
    pub framework_module: String,
    pub router_module: String,
    /// Emit a bundler glob for per-locale JSON next to the i18n concern.
    pub translations_glob: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            runtime_module: "weave/runtime".to_string(),
            framework_module: "react".to_string(),
            router_module: "react-router".to_string(),
            translations_glob: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let opts: SynthesisOptions =
            serde_json::from_str(r#"{ "runtimeModule": "@acme/weave/runtime" }"#).unwrap();
        assert_eq!(opts.runtime_module, "@acme/weave/runtime");
        assert_eq!(opts.framework_module, "react");
        assert!(opts.translations_glob);
    }
}
