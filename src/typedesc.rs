// Strongly-typed schema model. Everything the extractor emits is built from
// these types; the wire shape is fixed by the downstream binding generators.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Closed descriptor vocabulary for every field/underlying type we can render.
///
/// `Unknown` is the non-fatal fallback: the raw canonical spelling is kept so
/// the operator can chase it down, and the enclosing record still ships.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Scalar(Scalar),
    Optional(Box<TypeDescriptor>),
    Sequence(Box<TypeDescriptor>),
    Set(Box<TypeDescriptor>),
    /// Ordered alternatives, ≥1.
    Union(Vec<TypeDescriptor>),
    FixedArray {
        elem: Box<TypeDescriptor>,
        size: u64,
    },
    OrderedMap {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
        comparator: Option<Box<TypeDescriptor>>,
    },
    SharedRef(Box<TypeDescriptor>),
    /// Opaque callable; argument/return types are not modeled.
    Callable,
    /// Ordering relation used as a map comparator policy.
    Comparator {
        relation: Relation,
        /// `true` when the source spelled the `void` specialization.
        typed: bool,
    },
    /// Reference to a previously or later extracted struct/enum.
    Named(String),
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Size,
    Bool,
    F32,
    F64,
    String,
    ErrorCode,
    Monostate,
    Byte,
    Seconds,
    Millis,
    Micros,
    Nanos,
    NullPtr,
    Mutex,
}

impl Scalar {
    /// Spelling used in the output document (downstream generators key on these).
    pub fn wire_name(self) -> &'static str {
        match self {
            Scalar::I8 => "std::int8_t",
            Scalar::I16 => "std::int16_t",
            Scalar::I32 => "std::int32_t",
            Scalar::I64 => "std::int64_t",
            Scalar::U8 => "std::uint8_t",
            Scalar::U16 => "std::uint16_t",
            Scalar::U32 => "std::uint32_t",
            Scalar::U64 => "std::uint64_t",
            Scalar::Size => "std::size_t",
            Scalar::Bool => "std::bool",
            Scalar::F32 => "std::float",
            Scalar::F64 => "std::double",
            Scalar::String => "std::string",
            Scalar::ErrorCode => "std::error_code",
            Scalar::Monostate => "std::monostate",
            Scalar::Byte => "std::byte",
            Scalar::Seconds => "std::chrono::seconds",
            Scalar::Millis => "std::chrono::milliseconds",
            Scalar::Micros => "std::chrono::microseconds",
            Scalar::Nanos => "std::chrono::nanoseconds",
            Scalar::NullPtr => "std::nullptr_t",
            Scalar::Mutex => "std::mutex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl Relation {
    /// Both the `<>` and `<void>` source forms collapse to the `<>` spelling.
    pub fn wire_name(self) -> &'static str {
        match self {
            Relation::Less => "std::less<>",
            Relation::Greater => "std::greater<>",
            Relation::LessEqual => "std::less_equal<>",
            Relation::GreaterEqual => "std::greater_equal<>",
        }
    }
}

// ------------------------------- Records ---------------------------------- //

/// One struct field; order in the record matches source declaration order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

/// Extracted struct/class, keyed by its fully-qualified name.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StructRecord {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

/// Extracted enum with its underlying scalar and enumerators in source order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EnumRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub values: Vec<EnumValue>,
}

// ----------------------------- Serialization ------------------------------ //

// Wire shape: `{"name": …}` plus `of`/`to`/`size`/`comparator` payload keys,
// `{"name": "unknown", "str": raw}` for the fallback. Key order is part of
// the compatibility contract, hence the manual impl.
impl Serialize for TypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypeDescriptor::Scalar(sc) => name_only(serializer, sc.wire_name()),
            TypeDescriptor::Optional(of) => name_of(serializer, "std::optional", of),
            TypeDescriptor::Sequence(of) => name_of(serializer, "std::vector", of),
            TypeDescriptor::Set(of) => name_of(serializer, "std::set", of),
            TypeDescriptor::SharedRef(of) => name_of(serializer, "std::shared_ptr", of),
            TypeDescriptor::Union(alts) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("name", "std::variant")?;
                map.serialize_entry("of", alts)?;
                map.end()
            }
            TypeDescriptor::FixedArray { elem, size } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("name", "std::array")?;
                map.serialize_entry("of", elem)?;
                map.serialize_entry("size", size)?;
                map.end()
            }
            TypeDescriptor::OrderedMap {
                key,
                value,
                comparator,
            } => {
                let len = if comparator.is_some() { 4 } else { 3 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("name", "std::map")?;
                map.serialize_entry("of", key)?;
                map.serialize_entry("to", value)?;
                if let Some(cmp) = comparator {
                    map.serialize_entry("comparator", cmp)?;
                }
                map.end()
            }
            TypeDescriptor::Callable => name_only(serializer, "std::function"),
            TypeDescriptor::Comparator { relation, .. } => {
                name_only(serializer, relation.wire_name())
            }
            TypeDescriptor::Named(name) => name_only(serializer, name),
            TypeDescriptor::Unknown(raw) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("name", "unknown")?;
                map.serialize_entry("str", raw)?;
                map.end()
            }
        }
    }
}

fn name_only<S: Serializer>(serializer: S, name: &str) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry("name", name)?;
    map.end()
}

fn name_of<S: Serializer>(
    serializer: S,
    name: &str,
    of: &TypeDescriptor,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry("name", name)?;
    map.serialize_entry("of", of)?;
    map.end()
}

// ------------------------------- Tests ------------------------------------ //
