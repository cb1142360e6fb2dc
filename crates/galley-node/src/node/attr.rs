use ecow::EcoString;
use rustc_hash::FxHashMap;

use crate::geom::Sp;

/// A value attached to a node under a caller-chosen key.
///
/// The core never interprets attributes; they ferry cross-cutting metadata
/// (hyperlink targets, source tags, expansion factors) from producers to
/// downstream consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    /// A boolean flag.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A length.
    Length(Sp),
    /// A string.
    Str(EcoString),
}

/// The open-ended attribute map of a node.
pub type Attrs = FxHashMap<EcoString, Attr>;
