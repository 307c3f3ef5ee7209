//! Run configuration: which headers to walk, which qualified names to admit,
//! and which templated records to materialize.
//!
//! The built-in configuration mirrors the binding surface of the C++ client;
//! `--config` swaps in a JSON file with the same shape for experiments.
//! Everything in here is resolved before the first header is processed —
//! configuration problems are the only fatal errors in the pipeline.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {detail}")]
    Decode { path: PathBuf, detail: String },
    #[error("invalid allow pattern `{pattern}`: {source}")]
    AllowPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("wildcard only supported at end of file path: {0}")]
    WildcardPlacement(String),
    #[error("invalid file pattern `{pattern}`: {source}")]
    FilePattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("file pattern matched no headers: {0}")]
    EmptyMatch(String),
    #[error("declaration dump directory not found: {0}")]
    MissingAstRoot(PathBuf),
}

/// One templated record to materialize: the generic's parameter marker and
/// the concrete qualified names to substitute for it.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSpec {
    pub parameter_marker: String,
    pub substitutions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Header paths relative to the source root; a trailing `*` segment means
    /// "every matching header in this directory".
    #[serde(default)]
    pub files: Vec<String>,
    /// Qualified-name allow list; `*` is a trailing wildcard.
    #[serde(default)]
    pub allow_patterns: Vec<String>,
    /// Keyed by the generic record's head name.
    #[serde(default)]
    pub template_specs: IndexMap<String, TemplateSpec>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        decode_json_with_path(&src).map_err(|detail| ConfigError::Decode {
            path: path.to_path_buf(),
            detail,
        })
    }

    /// Expand the configured file list against `source_root`.
    ///
    /// Wildcard entries enumerate `.hxx` headers in their directory, minus
    /// the serialization (`_json.hxx`) and formatting (`_fmt.hxx`) companion
    /// files. Literal entries pass through untouched.
    pub fn expand_files(&self, source_root: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let mut out = Vec::new();
        for entry in &self.files {
            match entry.strip_suffix('*') {
                Some(base) => {
                    if base.contains('*') {
                        return Err(ConfigError::WildcardPlacement(entry.clone()));
                    }
                    let pattern = source_root.join(entry).display().to_string();
                    let mut matched = Vec::new();
                    let paths =
                        glob::glob(&pattern).map_err(|source| ConfigError::FilePattern {
                            pattern: entry.clone(),
                            source,
                        })?;
                    for path in paths.flatten() {
                        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                        if keeps_header(name) {
                            matched.push(path);
                        }
                    }
                    if matched.is_empty() {
                        return Err(ConfigError::EmptyMatch(entry.clone()));
                    }
                    out.extend(matched);
                }
                None => out.push(source_root.join(entry)),
            }
        }
        Ok(out)
    }

    /// The binding surface the downstream generators expect, as shipped.
    pub fn builtin() -> Self {
        Self {
            files: BUILTIN_FILES.iter().map(|s| s.to_string()).collect(),
            allow_patterns: BUILTIN_ALLOW_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            template_specs: builtin_template_specs(),
        }
    }
}

/// `.hxx` headers only, and never the generated companion doubles.
fn keeps_header(file_name: &str) -> bool {
    file_name.ends_with(".hxx")
        && !file_name.ends_with("_json.hxx")
        && !file_name.ends_with("_fmt.hxx")
}

/// Deserialize with JSON-path context in error messages.
pub(crate) fn decode_json_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de)
        .map_err(|err| format!("at JSON path {} → {}", err.path(), err.inner()))
}

// ---------------------------- Built-in tables ----------------------------- //

const BUILTIN_FILES: &[&str] = &[
    "core/management/analytics_dataset.hxx",
    "core/management/analytics_index.hxx",
    "core/management/analytics_link_azure_blob_external.hxx",
    "core/management/analytics_link_couchbase_remote.hxx",
    "core/management/analytics_link_s3_external.hxx",
    "core/management/bucket_settings.hxx",
    "core/management/design_document.hxx",
    "core/management/eventing_function.hxx",
    "core/management/eventing_status.hxx",
    "core/management/rbac.hxx",
    "core/management/search_index.hxx",
    "couchbase/management/query_index.hxx",
    "couchbase/retry_reason.hxx",
    "core/topology/collections_manifest.hxx",
    "core/protocol/client_opcode.hxx",
    "core/protocol/cmd_lookup_in.hxx",
    "core/protocol/cmd_mutate_in.hxx",
    "core/protocol/status.hxx",
    "core/analytics_scan_consistency.hxx",
    "core/design_document_namespace.hxx",
    "core/diagnostics.hxx",
    "core/document_id.hxx",
    "core/json_string.hxx",
    "couchbase/query_profile.hxx",
    "couchbase/query_scan_consistency.hxx",
    "core/search_highlight_style.hxx",
    "core/search_scan_consistency.hxx",
    "core/service_type.hxx",
    "core/view_on_error.hxx",
    "core/view_scan_consistency.hxx",
    "core/view_sort_order.hxx",
    "core/operations/*",
    "core/operations/management/*",
    "couchbase/durability_level.hxx",
    "couchbase/cas.hxx",
    "couchbase/error_codes.hxx",
    "couchbase/mutation_token.hxx",
    "core/error_context/key_value_status_code.hxx",
    "core/impl/subdoc/opcode.hxx",
    "core/impl/subdoc/command.hxx",
    "couchbase/store_semantics.hxx",
    "couchbase/persist_to.hxx",
    "couchbase/replicate_to.hxx",
    "couchbase/read_preference.hxx",
    "core/range_scan_options.hxx",
    "core/range_scan_orchestrator_options.hxx",
    "core/query_context.hxx",
    "core/vector_query_combination.hxx",
];

const BUILTIN_ALLOW_PATTERNS: &[&str] = &[
    "couchbase::core::management::analytics::dataset",
    "couchbase::core::management::analytics::index",
    "couchbase::core::management::analytics::azure_blob_external_link",
    "couchbase::core::management::analytics::couchbase_link_encryption_level",
    "couchbase::core::management::analytics::couchbase_link_encryption_settings",
    "couchbase::core::management::analytics::couchbase_remote_link",
    "couchbase::core::management::analytics::s3_external_link",
    "couchbase::core::management::cluster::bucket_settings",
    "couchbase::core::management::cluster::bucket_type",
    "couchbase::core::management::cluster::bucket_compression",
    "couchbase::core::management::cluster::bucket_eviction_policy",
    "couchbase::core::management::cluster::bucket_conflict_resolution",
    "couchbase::core::management::cluster::bucket_storage_backend",
    "couchbase::core::management::views::design_document",
    "couchbase::core::management::eventing::function",
    "couchbase::core::management::eventing::status",
    "couchbase::core::management::rbac::role",
    "couchbase::core::management::rbac::role_and_description",
    "couchbase::core::management::rbac::origin",
    "couchbase::core::management::rbac::role_and_origins",
    "couchbase::core::management::rbac::user",
    "couchbase::core::management::rbac::auth_domain",
    "couchbase::core::management::rbac::user_and_metadata",
    "couchbase::core::management::rbac::group",
    "couchbase::core::management::search::index",
    "couchbase::management::query_index",
    "couchbase::retry_reason",
    "couchbase::core::topology::collections_manifest",
    "couchbase::core::protocol::status",
    "couchbase::core::protocol::subdoc_opcode",
    "couchbase::core::protocol::lookup_in_request_body::lookup_in_specs",
    "couchbase::core::protocol::mutate_in_request_body::mutate_in_specs",
    "couchbase::core::protocol::mutate_in_request_body::store_semantics_type",
    "couchbase::durability_level",
    "couchbase::errc::common",
    "couchbase::errc::key_value",
    "couchbase::errc::query",
    "couchbase::errc::analytics",
    "couchbase::errc::search",
    "couchbase::errc::view",
    "couchbase::errc::management",
    "couchbase::errc::field_level_encryption",
    "couchbase::errc::network",
    "couchbase::core::analytics_scan_consistency",
    "couchbase::cas",
    "couchbase::core::design_document_namespace",
    "couchbase::core::diag::cluster_state",
    "couchbase::core::diag::endpoint_state",
    "couchbase::core::diag::endpoint_diag_info",
    "couchbase::core::diag::diagnostics_result",
    "couchbase::core::diag::ping_state",
    "couchbase::core::diag::endpoint_ping_info",
    "couchbase::core::diag::ping_result",
    "couchbase::core::document_id",
    "couchbase::core::json_string",
    "couchbase::mutation_token",
    "couchbase::query_profile",
    "couchbase::query_scan_consistency",
    "couchbase::core::search_highlight_style",
    "couchbase::core::search_scan_consistency",
    "couchbase::core::service_type",
    "couchbase::core::view_on_error",
    "couchbase::core::view_scan_consistency",
    "couchbase::core::view_sort_order",
    "couchbase::core::operations::*",
    "couchbase::core::operations::management::*",
    "couchbase::core::tracing::request_span",
    "couchbase::core::key_value_status_code",
    "couchbase::core::impl::subdoc::command",
    "couchbase::core::impl::subdoc::opcode",
    "couchbase::store_semantics",
    "couchbase::persist_to",
    "couchbase::replicate_to",
    "couchbase::core::range_scan_create_options",
    "couchbase::core::range_scan_continue_options",
    "couchbase::core::range_scan_cancel_options",
    "couchbase::core::range_scan_orchestrator_options",
    "couchbase::core::mutation_state",
    "couchbase::core::scan_term",
    "couchbase::core::scan_sort",
    "couchbase::core::range_scan",
    "couchbase::core::prefix_scan",
    "couchbase::core::sampling_scan",
    "couchbase::core::range_snapshot_requirements",
    "couchbase::core::range_scan_item_body",
    "couchbase::core::range_scan_item",
    "couchbase::core::range_scan_create_result",
    "couchbase::core::range_scan_continue_result",
    "couchbase::core::range_scan_cancel_result",
    "couchbase::core::query_context",
    "couchbase::core::vector_query_combination",
    "couchbase::read_preference",
];

const ANALYTICS_LINK_SUBSTITUTIONS: &[&str] = &[
    "couchbase::core::management::analytics::azure_blob_external_link",
    "couchbase::core::management::analytics::couchbase_remote_link",
    "couchbase::core::management::analytics::s3_external_link",
];

fn builtin_template_specs() -> IndexMap<String, TemplateSpec> {
    // the generics must also be reachable through the allow patterns
    let mut specs = IndexMap::new();
    for generic in ["analytics_link_create_request", "analytics_link_replace_request"] {
        specs.insert(
            generic.to_string(),
            TemplateSpec {
                parameter_marker: "analytics_link_type".to_string(),
                substitutions: ANALYTICS_LINK_SUBSTITUTIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
        );
    }
    specs
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_headers_are_excluded() {
        assert!(keeps_header("bucket_settings.hxx"));
        assert!(!keeps_header("bucket_settings_json.hxx"));
        assert!(!keeps_header("bucket_settings_fmt.hxx"));
        assert!(!keeps_header("bucket_settings.hpp"));
    }

    #[test]
    fn interior_wildcard_is_rejected() {
        let cfg = Config {
            files: vec!["core/*/operations/*".into()],
            allow_patterns: vec![],
            template_specs: IndexMap::new(),
        };
        let err = cfg.expand_files(Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, ConfigError::WildcardPlacement(_)));
    }

    #[test]
    fn config_decodes_from_json() {
        let cfg: Config = decode_json_with_path(
            r#"{
                "files": ["core/operations/*"],
                "allow_patterns": ["couchbase::core::operations::*"],
                "template_specs": {
                    "analytics_link_create_request": {
                        "parameter_marker": "analytics_link_type",
                        "substitutions": ["couchbase::core::management::analytics::s3_external_link"]
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.files.len(), 1);
        assert_eq!(
            cfg.template_specs["analytics_link_create_request"].substitutions.len(),
            1
        );
    }

    #[test]
    fn decode_errors_carry_the_json_path() {
        let err = decode_json_with_path::<Config>(r#"{"files": [1]}"#).unwrap_err();
        assert!(err.contains("files"), "{err}");
    }

    #[test]
    fn builtin_template_generics_are_allowed_types() {
        let cfg = Config::builtin();
        for generic in cfg.template_specs.keys() {
            assert!(
                cfg.allow_patterns
                    .iter()
                    .any(|p| p.ends_with("::*") || p.contains(generic.as_str())),
                "template generic {generic} unreachable through the allow list"
            );
        }
    }
}
