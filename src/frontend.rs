//! Front-end collaborator interface.
//!
//! The C++ parsing itself is out of scope: an external clang-based dumper
//! turns each header into a declaration tree (kind, display name, origin
//! file, canonical type spelling, children). This module defines that tree
//! shape, the [`DeclSource`] seam the pipeline consumes it through, and the
//! shipped implementation that loads pre-dumped JSON trees from disk.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::{ConfigError, decode_json_with_path};

/// Declaration kinds the walker dispatches on. Closed set: admitting a new
/// construct means adding a variant and satisfying the match arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    TranslationUnit,
    Namespace,
    Struct,
    Class,
    Enum,
    EnumConstant,
    Field,
    TypeAlias,
    TypeRef,
    BaseSpecifier,
    ClassTemplate,
}

/// One node of the declaration tree, as dumped by the front-end.
#[derive(Debug, Clone, Deserialize)]
pub struct Decl {
    pub kind: DeclKind,
    /// Display name; empty for anonymous aggregates.
    #[serde(default)]
    pub name: String,
    /// File the declaration was pulled in from; `None` on the root node.
    #[serde(default)]
    pub origin_file: Option<String>,
    /// Canonical, alias-free type spelling (type-bearing nodes only).
    #[serde(default)]
    pub canonical_type: Option<String>,
    /// Underlying scalar spelling (enum declarations only).
    #[serde(default)]
    pub underlying_type: Option<String>,
    /// Enumerator value (enum-constant nodes only).
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub children: Vec<Decl>,
}

/// Declaration tree plus whatever the front-end complained about while
/// parsing. Diagnostics are reported and processing continues.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub root: Decl,
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Error)]
pub enum FrontEndError {
    #[error("failed to read declaration dump {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid declaration dump {path}: {detail}")]
    Decode { path: PathBuf, detail: String },
}

/// Seam to the external front-end: given a header path, produce its
/// declaration tree. One blocking call per file, no partial results.
pub trait DeclSource {
    fn load(&self, header: &Path) -> Result<ParsedFile, FrontEndError>;
}

/// Loads `<ast_root>/<header relative to source_root>.json` dumps.
#[derive(Debug)]
pub struct DumpedAstSource {
    ast_root: PathBuf,
    source_root: PathBuf,
}

/// On-disk dump shape: the tree plus optional front-end diagnostics.
#[derive(Debug, Deserialize)]
struct AstDump {
    root: Decl,
    #[serde(default)]
    diagnostics: Vec<String>,
}

impl DumpedAstSource {
    /// Fails up front when the dump directory is missing; that is a
    /// configuration error and aborts the run before any per-file work.
    pub fn new(ast_root: PathBuf, source_root: PathBuf) -> Result<Self, ConfigError> {
        if !ast_root.is_dir() {
            return Err(ConfigError::MissingAstRoot(ast_root));
        }
        Ok(Self {
            ast_root,
            source_root,
        })
    }

    fn dump_path(&self, header: &Path) -> PathBuf {
        let relative = header.strip_prefix(&self.source_root).unwrap_or(header);
        let mut path = self.ast_root.join(relative);
        let mut file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        file_name.push_str(".json");
        path.set_file_name(file_name);
        path
    }
}

impl DeclSource for DumpedAstSource {
    fn load(&self, header: &Path) -> Result<ParsedFile, FrontEndError> {
        let path = self.dump_path(header);
        let src = std::fs::read_to_string(&path).map_err(|source| FrontEndError::Read {
            path: path.clone(),
            source,
        })?;
        let dump: AstDump =
            decode_json_with_path(&src).map_err(|detail| FrontEndError::Decode {
                path: path.clone(),
                detail,
            })?;
        Ok(ParsedFile {
            root: dump.root,
            diagnostics: dump.diagnostics,
        })
    }
}

// ------------------------------- Tests ------------------------------------ //
