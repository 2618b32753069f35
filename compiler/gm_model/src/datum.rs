//! Realized data carried by value nodes.
//!
//! A [`Datum`] is a scalar, a string, or an array of data. Arrays remember
//! their element type so that an array assembled one index at a time keeps a
//! declared component type even while some entries are still unset.

use std::fmt;

use crate::errors::{shape_mismatch, ModelResult};

/// Runtime type of a datum.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DatumType {
    Int,
    Float,
    Bool,
    Str,
    Array(Box<DatumType>),
}

impl DatumType {
    pub fn array_of(elem: DatumType) -> Self {
        DatumType::Array(Box::new(elem))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DatumType::Int | DatumType::Float)
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatumType::Int => f.write_str("Int"),
            DatumType::Float => f.write_str("Float"),
            DatumType::Bool => f.write_str("Bool"),
            DatumType::Str => f.write_str("String"),
            DatumType::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

/// Longest array that ranges, repetition and indexed writes will build.
pub const MAX_ARRAY_LEN: usize = 1 << 24;

/// An array with a declared element type and possibly-unset entries.
///
/// `None` is the unset sentinel left behind when an indexed assignment grows
/// the array past indices nobody has written yet.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayDatum {
    elem: DatumType,
    items: Vec<Option<Datum>>,
}

impl ArrayDatum {
    /// Fully-set array. Callers guarantee every item has type `elem`.
    pub fn new(elem: DatumType, items: Vec<Datum>) -> Self {
        ArrayDatum {
            elem,
            items: items.into_iter().map(Some).collect(),
        }
    }

    /// Array of `len` unset entries.
    pub fn unset(elem: DatumType, len: usize) -> Self {
        ArrayDatum {
            elem,
            items: vec![None; len],
        }
    }

    /// Builds an array from loose elements, inferring the element type.
    ///
    /// Mixed integers and floats widen to floats. An empty list is a float
    /// array.
    pub fn from_elements(elements: Vec<Datum>) -> ModelResult<Self> {
        let Some(first) = elements.first() else {
            return Ok(ArrayDatum::new(DatumType::Float, Vec::new()));
        };
        let mut elem = first.datum_type();
        for item in &elements[1..] {
            let ty = item.datum_type();
            if ty == elem {
                continue;
            }
            if elem.is_numeric() && ty.is_numeric() {
                elem = DatumType::Float;
            } else {
                return Err(shape_mismatch("array literal", &elem, &ty));
            }
        }
        let items = if elem == DatumType::Float {
            elements
                .into_iter()
                .map(|d| match d {
                    Datum::Int(i) => Datum::Float(i as f64),
                    other => other,
                })
                .collect()
        } else {
            elements
        };
        Ok(ArrayDatum::new(elem, items))
    }

    pub fn elem(&self) -> &DatumType {
        &self.elem
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The entry at `index`, or `None` if out of bounds or unset.
    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.items.get(index).and_then(Option::as_ref)
    }

    pub fn items(&self) -> &[Option<Datum>] {
        &self.items
    }

    /// Grows to at least `len` entries. Never shrinks.
    pub fn grow_to(&mut self, len: usize) {
        if len > self.items.len() {
            self.items.resize(len, None);
        }
    }

    /// Writes `index`, growing the array if needed.
    pub fn set(&mut self, index: usize, value: Datum) {
        self.grow_to(index + 1);
        self.items[index] = Some(value);
    }

    /// Writes or clears `index`, growing the array if needed.
    pub fn set_entry(&mut self, index: usize, value: Option<Datum>) {
        self.grow_to(index + 1);
        self.items[index] = value;
    }

    /// All entries, failing on the first unset one.
    pub fn set_items(&self, context: &str) -> ModelResult<Vec<&Datum>> {
        self.items
            .iter()
            .map(|item| item.as_ref().ok_or_else(|| shape_mismatch(context, &self.elem, "unset entry")))
            .collect()
    }
}

/// A realized value.
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Array(ArrayDatum),
}

impl Datum {
    pub fn int_array(items: impl IntoIterator<Item = i64>) -> Self {
        Datum::Array(ArrayDatum::new(
            DatumType::Int,
            items.into_iter().map(Datum::Int).collect(),
        ))
    }

    pub fn float_array(items: impl IntoIterator<Item = f64>) -> Self {
        Datum::Array(ArrayDatum::new(
            DatumType::Float,
            items.into_iter().map(Datum::Float).collect(),
        ))
    }

    /// A 2-D float array from rows.
    pub fn matrix(rows: impl IntoIterator<Item = Vec<f64>>) -> Self {
        Datum::Array(ArrayDatum::new(
            DatumType::array_of(DatumType::Float),
            rows.into_iter().map(Datum::float_array).collect(),
        ))
    }

    pub fn datum_type(&self) -> DatumType {
        match self {
            Datum::Int(_) => DatumType::Int,
            Datum::Float(_) => DatumType::Float,
            Datum::Bool(_) => DatumType::Bool,
            Datum::Str(_) => DatumType::Str,
            Datum::Array(array) => DatumType::array_of(array.elem.clone()),
        }
    }

    /// Numeric view; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Datum::Int(i) => Some(i as f64),
            Datum::Float(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Datum::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Datum::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayDatum> {
        match self {
            Datum::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Every entry as `f64`, if this is a fully-set numeric array.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        self.as_array()?
            .items()
            .iter()
            .map(|item| item.as_ref().and_then(Datum::as_f64))
            .collect()
    }

    /// Every entry as `i64`, if this is a fully-set integer array.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        self.as_array()?
            .items()
            .iter()
            .map(|item| item.as_ref().and_then(Datum::as_i64))
            .collect()
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Int(i) => write!(f, "{i}"),
            Datum::Float(x) => write!(f, "{x:?}"),
            Datum::Bool(b) => write!(f, "{b}"),
            Datum::Str(s) => write!(f, "\"{s}\""),
            Datum::Array(array) => {
                f.write_str("[")?;
                for (i, item) in array.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Some(d) => write!(f, "{d}")?,
                        None => f.write_str("_")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_elements_widens_mixed_numbers() {
        let array = ArrayDatum::from_elements(vec![Datum::Int(1), Datum::Float(2.5)]).unwrap();
        assert_eq!(array.elem(), &DatumType::Float);
        assert_eq!(
            Datum::Array(array).to_f64_vec(),
            Some(vec![1.0, 2.5])
        );
    }

    #[test]
    fn from_elements_rejects_mixed_kinds() {
        let err = ArrayDatum::from_elements(vec![Datum::Int(1), Datum::Bool(true)]).unwrap_err();
        assert!(matches!(err, crate::ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn set_grows_and_leaves_gaps_unset() {
        let mut array = ArrayDatum::unset(DatumType::Float, 1);
        array.set(2, Datum::Float(3.0));
        assert_eq!(array.len(), 3);
        assert_eq!(array.get(1), None);
        assert_eq!(array.get(2), Some(&Datum::Float(3.0)));
        assert_eq!(Datum::Array(array).to_string(), "[_, _, 3.0]");
    }

    #[test]
    fn grow_never_shrinks() {
        let mut array = ArrayDatum::unset(DatumType::Int, 4);
        array.grow_to(2);
        assert_eq!(array.len(), 4);
    }

    #[test]
    fn nested_types_display() {
        let m = Datum::matrix(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(m.datum_type().to_string(), "Float[][]");
    }
}
