//! Final document assembly.
//!
//! By the time a run reaches this point every file has been walked and
//! materialized into the shared [`ExtractPass`]; assembly is just flattening
//! the ordered maps into the two top-level lists the serialization contract
//! names. No reordering, no further dedup — first-wins already happened at
//! insertion, and insertion order is file-processing order.

use serde::Serialize;

use crate::typedesc::{EnumRecord, StructRecord};
use crate::walker::ExtractPass;

/// The document handed to downstream binding generators. Field and
/// enumerator order inside each record matches source declaration order;
/// generators render fields positionally.
#[derive(Debug, Serialize)]
pub struct SchemaDocument {
    pub op_structs: Vec<StructRecord>,
    pub op_enums: Vec<EnumRecord>,
}

pub fn assemble(pass: ExtractPass) -> SchemaDocument {
    SchemaDocument {
        op_structs: pass.structs.into_values().collect(),
        op_enums: pass.enums.into_values().collect(),
    }
}

impl SchemaDocument {
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::InclusionFilter;
    use crate::frontend::Decl;
    use serde_json::json;

    fn sample_tree() -> Decl {
        serde_json::from_value(json!({
            "kind": "translation_unit",
            "children": [{
                "kind": "namespace", "name": "couchbase", "origin_file": "cas.hxx",
                "children": [
                    {
                        "kind": "class", "name": "cas", "origin_file": "cas.hxx",
                        "children": [{
                            "kind": "field", "name": "value_", "origin_file": "cas.hxx",
                            "canonical_type": "unsigned long long"
                        }]
                    },
                    {
                        "kind": "enum", "name": "store_semantics", "origin_file": "cas.hxx",
                        "underlying_type": "unsigned char",
                        "children": [
                            {"kind": "enum_constant", "name": "replace", "origin_file": "cas.hxx", "value": 0},
                            {"kind": "enum_constant", "name": "upsert", "origin_file": "cas.hxx", "value": 1}
                        ]
                    }
                ]
            }]
        }))
        .unwrap()
    }

    fn run_once() -> String {
        let filter = InclusionFilter::new(&[
            "couchbase::cas".to_string(),
            "couchbase::store_semantics".to_string(),
        ])
        .unwrap();
        let mut pass = ExtractPass::new();
        pass.walk_file(&filter, &sample_tree(), "cas.hxx");
        assemble(pass).to_json_string().unwrap()
    }

    #[test]
    fn document_has_the_two_top_level_keys() {
        let doc: serde_json::Value = serde_json::from_str(&run_once()).unwrap();
        assert_eq!(
            doc["op_structs"],
            json!([{
                "name": "couchbase::cas",
                "fields": [{"name": "value_", "type": {"name": "std::uint64_t"}}]
            }])
        );
        assert_eq!(doc["op_enums"][0]["type"], json!({"name": "std::uint8_t"}));
        assert_eq!(doc["op_enums"][0]["values"][1]["name"], "upsert");
    }

    #[test]
    fn reruns_are_byte_identical() {
        assert_eq!(run_once(), run_once());
    }
}
