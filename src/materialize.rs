//! Post-walk materialization: legacy-durability alias variants and
//! template specializations.
//!
//! Runs once per file, after the walker, against the run-wide accumulated
//! records: an alias may reference a base extracted from an earlier file.
//! Neither path mutates its source — derived and specialized records are
//! new entries, and the generic form of a template is never emitted at all.

use indexmap::IndexMap;

use crate::config::TemplateSpec;
use crate::diag;
use crate::typedesc::{FieldDescriptor, StructRecord, TypeDescriptor};
use crate::walker::{ExtractPass, TemplateField};

/// Field dropped from the base record during alias derivation.
const DURABILITY_FIELD: &str = "durability_level";
/// Replacement policy fields appended in its place, in this order.
const LEGACY_FIELDS: [(&str, &str); 2] = [
    ("persist_to", "couchbase::persist_to"),
    ("replicate_to", "couchbase::replicate_to"),
];

pub fn run(pass: &mut ExtractPass, template_specs: &IndexMap<String, TemplateSpec>) {
    derive_legacy_durability(pass);
    materialize_templates(pass, template_specs);
}

/// `<base>_with_legacy_durability` aliases become copies of the base record
/// with `durability_level` swapped for the two legacy acknowledgement
/// fields. The base record stays untouched. An alias whose base was never
/// extracted is simply not emitted.
fn derive_legacy_durability(pass: &mut ExtractPass) {
    for request in pass.take_alias_requests() {
        let Some(base) = pass.structs.get(&request.base_name) else {
            diag::note(format!(
                "alias {} references unextracted base {}; skipped",
                request.qualified_name, request.base_name
            ));
            continue;
        };
        let mut fields: Vec<FieldDescriptor> = base
            .fields
            .iter()
            .filter(|f| f.name != DURABILITY_FIELD)
            .cloned()
            .collect();
        for (name, target) in LEGACY_FIELDS {
            fields.push(FieldDescriptor {
                name: name.to_string(),
                ty: TypeDescriptor::Named(target.to_string()),
            });
        }
        pass.insert_struct(StructRecord {
            name: request.qualified_name,
            fields,
        });
    }
}

/// One concrete record per configured substitution: the parameter marker in
/// the qualified name is rewritten to the substitution's qualified name, and
/// parameter-typed fields become `named` references to it.
fn materialize_templates(pass: &mut ExtractPass, template_specs: &IndexMap<String, TemplateSpec>) {
    for capture in pass.take_template_captures() {
        let Some(spec) = template_specs.get(&capture.generic_name) else {
            continue;
        };
        for substitution in &spec.substitutions {
            let name = capture
                .qualified_name
                .replace(&spec.parameter_marker, substitution);
            let fields = capture
                .fields
                .iter()
                .map(|f| match f {
                    TemplateField::Parameter { name } => FieldDescriptor {
                        name: name.clone(),
                        ty: TypeDescriptor::Named(substitution.clone()),
                    },
                    TemplateField::Concrete { name, ty } => FieldDescriptor {
                        name: name.clone(),
                        ty: ty.clone(),
                    },
                })
                .collect();
            pass.insert_struct(StructRecord { name, fields });
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typedesc::{Scalar, TypeDescriptor as T};
    use crate::walker::AliasRequest;

    fn field(name: &str, ty: T) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            ty,
        }
    }

    fn pass_with_base() -> ExtractPass {
        let mut pass = ExtractPass::new();
        pass.insert_struct(StructRecord {
            name: "couchbase::core::operations::upsert_request".into(),
            fields: vec![
                field("x", T::Scalar(Scalar::String)),
                field("durability_level", T::Named("couchbase::durability_level".into())),
                field("y", T::Scalar(Scalar::Bool)),
            ],
        });
        pass
    }

    fn push_alias(pass: &mut ExtractPass, qualified: &str, base: &str) {
        pass.alias_requests.push(AliasRequest {
            qualified_name: qualified.to_string(),
            base_name: base.to_string(),
        });
    }

    #[test]
    fn alias_derivation_swaps_durability_for_legacy_fields() {
        let mut pass = pass_with_base();
        push_alias(
            &mut pass,
            "couchbase::core::operations::upsert_request_with_legacy_durability",
            "couchbase::core::operations::upsert_request",
        );
        run(&mut pass, &IndexMap::new());

        let derived = &pass.structs
            ["couchbase::core::operations::upsert_request_with_legacy_durability"];
        let names: Vec<&str> = derived.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["x", "y", "persist_to", "replicate_to"]);
        assert_eq!(
            derived.fields[2].ty,
            T::Named("couchbase::persist_to".into())
        );

        // base record unchanged and still present
        let base = &pass.structs["couchbase::core::operations::upsert_request"];
        assert_eq!(base.fields.len(), 3);
        assert_eq!(base.fields[1].name, "durability_level");
    }

    #[test]
    fn alias_with_unextracted_base_is_omitted() {
        let mut pass = ExtractPass::new();
        push_alias(
            &mut pass,
            "couchbase::core::operations::insert_request_with_legacy_durability",
            "couchbase::core::operations::insert_request",
        );
        run(&mut pass, &IndexMap::new());
        assert!(pass.structs.is_empty());
    }

    #[test]
    fn templates_materialize_one_record_per_substitution() {
        let mut pass = ExtractPass::new();
        pass.template_captures.push(crate::walker::TemplateCapture {
            generic_name: "analytics_link_create_request".into(),
            qualified_name:
                "couchbase::core::operations::management::analytics_link_create_request<analytics_link_type>"
                    .into(),
            fields: vec![
                TemplateField::Concrete {
                    name: "timeout".into(),
                    ty: T::Scalar(Scalar::Millis),
                },
                TemplateField::Parameter {
                    name: "link".into(),
                },
            ],
        });

        let mut specs = IndexMap::new();
        specs.insert(
            "analytics_link_create_request".to_string(),
            TemplateSpec {
                parameter_marker: "analytics_link_type".to_string(),
                substitutions: vec![
                    "couchbase::core::management::analytics::azure_blob_external_link".into(),
                    "couchbase::core::management::analytics::couchbase_remote_link".into(),
                    "couchbase::core::management::analytics::s3_external_link".into(),
                ],
            },
        );
        run(&mut pass, &specs);

        assert_eq!(pass.structs.len(), 3);
        // the generic form itself never appears
        assert!(
            pass.structs
                .keys()
                .all(|k| !k.contains("analytics_link_type"))
        );
        let s3 = &pass.structs["couchbase::core::operations::management::analytics_link_create_request<couchbase::core::management::analytics::s3_external_link>"];
        assert_eq!(s3.fields[0].ty, T::Scalar(Scalar::Millis));
        assert_eq!(
            s3.fields[1].ty,
            T::Named("couchbase::core::management::analytics::s3_external_link".into())
        );
    }

    #[test]
    fn unconfigured_templates_are_ignored() {
        let mut pass = ExtractPass::new();
        pass.template_captures.push(crate::walker::TemplateCapture {
            generic_name: "unrelated_request".into(),
            qualified_name: "couchbase::core::operations::unrelated_request<T>".into(),
            fields: vec![],
        });
        run(&mut pass, &IndexMap::new());
        assert!(pass.structs.is_empty());
    }
}
