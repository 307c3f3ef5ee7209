//! Declaration walker: one pass per header over the front-end's tree.
//!
//! The walk threads an explicit scope stack (passed by value at each step,
//! so exiting a subtree restores scope for free) and accumulates into an
//! [`ExtractPass`] that lives for the whole run: extracted records, the
//! anonymous-aggregate registry, and the alias/template captures the
//! materializer consumes after each file.

use indexmap::IndexMap;

use crate::diag;
use crate::filter::{InclusionFilter, Mode};
use crate::frontend::{Decl, DeclKind};
use crate::typedesc::{EnumRecord, EnumValue, FieldDescriptor, StructRecord, TypeDescriptor};
use crate::typeparse;

/// Marker clang puts in the qualified name of an anonymous aggregate.
const UNNAMED_STRUCT_DELIM: &str = "::(unnamed struct";

/// Alias awaiting derivation against its base record.
#[derive(Debug, Clone)]
pub struct AliasRequest {
    pub qualified_name: String,
    pub base_name: String,
}

/// Field of a captured class template; parameter-typed fields are
/// substituted per configured target during materialization.
#[derive(Debug, Clone)]
pub enum TemplateField {
    Parameter { name: String },
    Concrete { name: String, ty: TypeDescriptor },
}

/// A class template whose head name may match a configured template spec.
#[derive(Debug, Clone)]
pub struct TemplateCapture {
    /// Head name without the parameter list, e.g. `analytics_link_create_request`.
    pub generic_name: String,
    /// Fully qualified display name, parameter list included.
    pub qualified_name: String,
    pub fields: Vec<TemplateField>,
}

/// Mutable context threaded through the whole run.
///
/// Record maps are keyed by qualified name; insertion order is output order
/// and the first occurrence always wins. The anonymous-aggregate registry is
/// append-only: once synthesized, a name stays resolvable for the rest of
/// the run.
#[derive(Debug, Default)]
pub struct ExtractPass {
    pub structs: IndexMap<String, StructRecord>,
    pub enums: IndexMap<String, EnumRecord>,
    anon_registry: Vec<String>,
    pub(crate) alias_requests: Vec<AliasRequest>,
    pub(crate) template_captures: Vec<TemplateCapture>,
}

impl ExtractPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk one header's declaration tree. `origin_file` must match the
    /// `origin_file` the front-end stamped on this file's own declarations;
    /// anything pulled in from other headers is skipped here and processed
    /// when its own file is walked.
    pub fn walk_file(&mut self, filter: &InclusionFilter, root: &Decl, origin_file: &str) {
        self.walk_node(filter, root, &[], origin_file);
    }

    pub fn take_alias_requests(&mut self) -> Vec<AliasRequest> {
        std::mem::take(&mut self.alias_requests)
    }

    pub fn take_template_captures(&mut self) -> Vec<TemplateCapture> {
        std::mem::take(&mut self.template_captures)
    }

    /// First-wins insert; duplicates are dropped, observably.
    pub fn insert_struct(&mut self, record: StructRecord) {
        if self.structs.contains_key(&record.name) {
            diag::note(format!("duplicate struct dropped: {}", record.name));
            return;
        }
        self.structs.insert(record.name.clone(), record);
    }

    fn walk_node(&mut self, filter: &InclusionFilter, node: &Decl, scope: &[String], origin: &str) {
        if let Some(file) = &node.origin_file {
            if file != origin {
                return;
            }
        }

        match node.kind {
            DeclKind::Struct | DeclKind::Class => self.visit_struct(filter, node, scope),
            DeclKind::Enum => self.visit_enum(filter, node, scope),
            DeclKind::TypeAlias => self.visit_alias(filter, node, scope),
            DeclKind::ClassTemplate => self.visit_template(node, scope),
            DeclKind::TranslationUnit
            | DeclKind::Namespace
            | DeclKind::EnumConstant
            | DeclKind::Field
            | DeclKind::TypeRef
            | DeclKind::BaseSpecifier => {}
        }

        // rejected declarations may still contain admitted nested ones
        let child_scope: Vec<String> = match node.kind {
            DeclKind::Namespace | DeclKind::Struct | DeclKind::Class => {
                let mut s = scope.to_vec();
                s.push(node.name.clone());
                s
            }
            _ => scope.to_vec(),
        };
        for child in &node.children {
            self.walk_node(filter, child, &child_scope, origin);
        }
    }

    fn visit_struct(&mut self, filter: &InclusionFilter, node: &Decl, scope: &[String]) {
        let mut qualified = qualify(scope, &node.name);

        // anonymous aggregates: re-match against the registry entry that was
        // synthesized when the owning field was seen
        if qualified.ends_with("::") || qualified.contains(UNNAMED_STRUCT_DELIM) {
            let probe = if qualified.ends_with("::") {
                qualified.clone()
            } else {
                qualified
                    .split(UNNAMED_STRUCT_DELIM)
                    .next()
                    .unwrap_or_default()
                    .to_string()
            };
            if let Some(found) = self.anon_registry.iter().find(|s| s.contains(&probe)) {
                qualified = found.clone();
            }
        }

        // anonymous aggregates bypass the allow list; they only exist nested
        // inside an admitted parent
        let registered = self.anon_registry.iter().any(|s| *s == qualified);
        if !filter.is_included(&qualified, Mode::Normal) && !registered {
            return;
        }

        let mut fields = Vec::new();
        let mut bases = Vec::new();
        for child in &node.children {
            match child.kind {
                DeclKind::Field => {
                    let spelling = child.canonical_type.as_deref().unwrap_or_default();
                    let mut ty = typeparse::parse_type(spelling);
                    if spelling.contains("unnamed") {
                        let synthesized = synthesize_anon_name(spelling, &child.name);
                        self.anon_registry.push(synthesized.clone());
                        ty = TypeDescriptor::Named(synthesized);
                    }
                    fields.push(FieldDescriptor {
                        name: child.name.clone(),
                        ty,
                    });
                }
                DeclKind::BaseSpecifier => bases.push(qualify(scope, &child.name)),
                _ => {}
            }
        }

        // single-level inheritance flattening: inherited fields append after
        // own-declared fields. A base extracted later in the run contributes
        // nothing; see the base_after_derived regression test.
        for base in &bases {
            if let Some(base_record) = self.structs.get(base) {
                fields.extend(base_record.fields.iter().cloned());
            }
        }

        self.insert_struct(StructRecord {
            name: qualified,
            fields,
        });
    }

    fn visit_enum(&mut self, filter: &InclusionFilter, node: &Decl, scope: &[String]) {
        let qualified = qualify(scope, &node.name);
        if !filter.is_included(&qualified, Mode::Normal) {
            return;
        }
        if self.enums.contains_key(&qualified) {
            diag::note(format!("duplicate enum dropped: {qualified}"));
            return;
        }
        let ty = typeparse::parse_type(node.underlying_type.as_deref().unwrap_or_default());
        let values = node
            .children
            .iter()
            .filter(|c| c.kind == DeclKind::EnumConstant)
            .map(|c| EnumValue {
                name: c.name.clone(),
                value: c.value.unwrap_or_default(),
            })
            .collect();
        self.enums.insert(
            qualified.clone(),
            EnumRecord {
                name: qualified,
                ty,
                values,
            },
        );
    }

    fn visit_alias(&mut self, filter: &InclusionFilter, node: &Decl, scope: &[String]) {
        let qualified = qualify(scope, &node.name);
        if !filter.is_included(&qualified, Mode::MarkerSuffix) {
            return;
        }
        let Some(type_ref) = node
            .children
            .iter()
            .find(|c| c.kind == DeclKind::TypeRef)
        else {
            return;
        };
        // clang spells the referenced type as `struct <qualified name>`
        let base_name = type_ref.name.replace("struct", "").trim().to_string();
        self.alias_requests.push(AliasRequest {
            qualified_name: qualified,
            base_name,
        });
    }

    fn visit_template(&mut self, node: &Decl, scope: &[String]) {
        // only single-parameter heads like `name<marker>` are candidates;
        // whether the head is actually materialized is the template specs'
        // call, not ours
        let mut tokens = node.name.splitn(3, '<');
        let (Some(head), Some(_), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return;
        };
        let fields = node
            .children
            .iter()
            .filter(|c| c.kind == DeclKind::Field)
            .map(|c| {
                let spelling = c.canonical_type.as_deref().unwrap_or_default();
                if spelling.contains("type-parameter") {
                    TemplateField::Parameter {
                        name: c.name.clone(),
                    }
                } else {
                    TemplateField::Concrete {
                        name: c.name.clone(),
                        ty: typeparse::parse_type(spelling),
                    }
                }
            })
            .collect();
        self.template_captures.push(TemplateCapture {
            generic_name: head.to_string(),
            qualified_name: qualify(scope, &node.name),
            fields,
        });
    }
}

/// Scope chain joined by `::`; an empty declared name leaves a trailing `::`
/// (the anonymous-aggregate probe relies on that).
fn qualify(scope: &[String], name: &str) -> String {
    let mut parts: Vec<&str> = scope.iter().map(String::as_str).collect();
    parts.push(name);
    parts.join("::")
}

/// `enclosing::(unnamed struct …)` + field name → `enclosing::<field>`.
fn synthesize_anon_name(spelling: &str, field_name: &str) -> String {
    let mut tokens: Vec<&str> = spelling.split("::").collect();
    tokens.pop();
    tokens.push(field_name);
    tokens.join("::")
}

// ------------------------------- Tests ------------------------------------ //
