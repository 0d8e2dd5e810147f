//! Value kinds
//!
//! Every value an equation can produce or consume has exactly one [`Kind`]:
//! one of the four scalar kinds or a homogeneous list of one of them.

use bitflags::bitflags;
use std::fmt;

/// The shape of a [`Value`](crate::Value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// 64-bit floating point
    Float,
    /// 64-bit signed integer
    Integer,
    /// UTF-8 string
    String,
    /// TRUE/FALSE
    Boolean,
    /// List of floats
    FloatList,
    /// List of integers
    IntegerList,
    /// List of strings
    StringList,
    /// List of booleans
    BooleanList,
}

impl Kind {
    /// All kinds, scalars first
    pub const ALL: [Kind; 8] = [
        Kind::Float,
        Kind::Integer,
        Kind::String,
        Kind::Boolean,
        Kind::FloatList,
        Kind::IntegerList,
        Kind::StringList,
        Kind::BooleanList,
    ];

    /// Check if this is a list kind
    pub fn is_list(self) -> bool {
        matches!(
            self,
            Kind::FloatList | Kind::IntegerList | Kind::StringList | Kind::BooleanList
        )
    }

    /// Check if this is Float or Integer
    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Float | Kind::Integer)
    }

    /// The element kind of a list, or the kind itself for scalars
    pub fn element(self) -> Kind {
        match self {
            Kind::FloatList => Kind::Float,
            Kind::IntegerList => Kind::Integer,
            Kind::StringList => Kind::String,
            Kind::BooleanList => Kind::Boolean,
            scalar => scalar,
        }
    }

    /// The list kind holding elements of this kind
    pub fn list_of(self) -> Kind {
        match self {
            Kind::Float | Kind::FloatList => Kind::FloatList,
            Kind::Integer | Kind::IntegerList => Kind::IntegerList,
            Kind::String | Kind::StringList => Kind::StringList,
            Kind::Boolean | Kind::BooleanList => Kind::BooleanList,
        }
    }

    /// The single-member [`KindSet`] for this kind
    pub fn as_set(self) -> KindSet {
        match self {
            Kind::Float => KindSet::FLOAT,
            Kind::Integer => KindSet::INTEGER,
            Kind::String => KindSet::STRING,
            Kind::Boolean => KindSet::BOOLEAN,
            Kind::FloatList => KindSet::FLOAT_LIST,
            Kind::IntegerList => KindSet::INTEGER_LIST,
            Kind::StringList => KindSet::STRING_LIST,
            Kind::BooleanList => KindSet::BOOLEAN_LIST,
        }
    }

    /// Human-readable name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Kind::Float => "Floating Point",
            Kind::Integer => "Integer",
            Kind::String => "String",
            Kind::Boolean => "Boolean",
            Kind::FloatList => "List of Floating Point",
            Kind::IntegerList => "List of Integer",
            Kind::StringList => "List of String",
            Kind::BooleanList => "List of Boolean",
        }
    }

    /// Parse a kind from a short name (`float`, `int`, `string_list`, ...)
    ///
    /// Matching is case-insensitive. Used by front-ends that let users
    /// declare variable kinds as text.
    pub fn from_name(name: &str) -> Option<Kind> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "float" | "double" | "number" => Kind::Float,
            "int" | "integer" | "long" => Kind::Integer,
            "string" | "str" | "text" => Kind::String,
            "bool" | "boolean" => Kind::Boolean,
            "float_list" | "floatlist" => Kind::FloatList,
            "int_list" | "integer_list" | "integerlist" => Kind::IntegerList,
            "string_list" | "stringlist" => Kind::StringList,
            "bool_list" | "boolean_list" | "booleanlist" => Kind::BooleanList,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of accepted kinds, e.g. for one function argument.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct KindSet: u16 {
        const FLOAT = 1 << 0;
        const INTEGER = 1 << 1;
        const STRING = 1 << 2;
        const BOOLEAN = 1 << 3;
        const FLOAT_LIST = 1 << 4;
        const INTEGER_LIST = 1 << 5;
        const STRING_LIST = 1 << 6;
        const BOOLEAN_LIST = 1 << 7;

        /// Float or Integer
        const NUMERIC = Self::FLOAT.bits() | Self::INTEGER.bits();
        /// Lists of Float or Integer
        const NUMERIC_LIST = Self::FLOAT_LIST.bits() | Self::INTEGER_LIST.bits();
        /// Any of the four scalar kinds
        const SCALAR = Self::FLOAT.bits()
            | Self::INTEGER.bits()
            | Self::STRING.bits()
            | Self::BOOLEAN.bits();
        /// Any list kind
        const LIST = Self::FLOAT_LIST.bits()
            | Self::INTEGER_LIST.bits()
            | Self::STRING_LIST.bits()
            | Self::BOOLEAN_LIST.bits();
        /// Everything
        const ANY = Self::SCALAR.bits() | Self::LIST.bits();
    }
}

impl KindSet {
    /// Check if `kind` is a member of this set
    pub fn accepts(self, kind: Kind) -> bool {
        self.contains(kind.as_set())
    }

    /// Iterate over the member kinds in declaration order
    pub fn kinds(self) -> impl Iterator<Item = Kind> {
        Kind::ALL.into_iter().filter(move |k| self.accepts(*k))
    }
}

impl From<Kind> for KindSet {
    fn from(kind: Kind) -> Self {
        kind.as_set()
    }
}
