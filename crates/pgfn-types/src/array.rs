//! Dynamically dimensioned arrays of `float8`.
//!
//! Elements are stored flat, in row-major storage order, next to a
//! dimensionality descriptor. Empty arrays are normalized to zero
//! dimensions, as the host does.

use pgfn_error::{PgFnError, Result};

/// Maximum number of array dimensions.
pub const MAX_ARRAY_DIMS: usize = 6;

/// A `float8[]` value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Float8ArrayRepr")]
pub struct Float8Array {
    dims: Vec<usize>,
    lower_bounds: Vec<i32>,
    elements: Vec<f64>,
}

#[derive(serde::Deserialize)]
struct Float8ArrayRepr {
    dims: Vec<usize>,
    lower_bounds: Vec<i32>,
    elements: Vec<f64>,
}

impl TryFrom<Float8ArrayRepr> for Float8Array {
    type Error = PgFnError;

    fn try_from(repr: Float8ArrayRepr) -> Result<Self> {
        Self::with_lower_bounds(repr.dims, repr.lower_bounds, repr.elements)
    }
}

impl Float8Array {
    /// An empty, zero-dimensional array.
    pub const fn empty() -> Self {
        Self {
            dims: Vec::new(),
            lower_bounds: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// A one-dimensional array holding a copy of `values`.
    pub fn from_slice(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        Self {
            dims: vec![values.len()],
            lower_bounds: vec![1],
            elements: values.to_vec(),
        }
    }

    /// Build an array from its extents and flat elements, lower bounds 1.
    pub fn new(dims: Vec<usize>, elements: Vec<f64>) -> Result<Self> {
        let lower_bounds = vec![1; dims.len()];
        Self::with_lower_bounds(dims, lower_bounds, elements)
    }

    /// Build an array from extents, lower bounds and flat elements.
    ///
    /// The element count must equal the product of the extents.
    pub fn with_lower_bounds(
        dims: Vec<usize>,
        lower_bounds: Vec<i32>,
        elements: Vec<f64>,
    ) -> Result<Self> {
        if dims.len() > MAX_ARRAY_DIMS {
            return Err(PgFnError::out_of_range(
                "number of array dimensions",
                format!("{} (max {MAX_ARRAY_DIMS})", dims.len()),
            ));
        }
        if lower_bounds.len() != dims.len() {
            return Err(malformed(format!(
                "{} lower bound(s) for {} dimension(s)",
                lower_bounds.len(),
                dims.len()
            )));
        }
        let expected = element_count(&dims)?;
        if expected != elements.len() {
            return Err(malformed(format!(
                "dimensions {dims:?} describe {expected} element(s), got {}",
                elements.len()
            )));
        }
        if expected == 0 {
            return Ok(Self::empty());
        }
        Ok(Self {
            dims,
            lower_bounds,
            elements,
        })
    }

    /// Number of dimensions (0 for an empty array).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Per-dimension extents.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Per-dimension lower bounds.
    pub fn lower_bounds(&self) -> &[i32] {
        &self.lower_bounds
    }

    /// Flattened element count.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements in storage order, ignoring dimensionality.
    pub fn as_slice(&self) -> &[f64] {
        &self.elements
    }

    /// Iterate elements in storage order.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.elements.iter()
    }

    /// The host's text output form, e.g. `{{1,2},{3,4}}`.
    pub fn to_text_output(&self) -> String {
        if self.is_empty() {
            return "{}".to_owned();
        }
        let mut out = String::new();
        let mut cursor = 0;
        write_level(&mut out, &self.dims, &self.elements, &mut cursor);
        out
    }
}

fn write_level(out: &mut String, dims: &[usize], elements: &[f64], cursor: &mut usize) {
    out.push('{');
    for i in 0..dims[0] {
        if i > 0 {
            out.push(',');
        }
        if dims.len() == 1 {
            out.push_str(&crate::format_float8(elements[*cursor]));
            *cursor += 1;
        } else {
            write_level(out, &dims[1..], elements, cursor);
        }
    }
    out.push('}');
}

fn element_count(dims: &[usize]) -> Result<usize> {
    if dims.is_empty() {
        return Ok(0);
    }
    let mut count = 1_usize;
    for &d in dims {
        let Some(next) = count.checked_mul(d) else {
            let detail = format!("array size overflows for dimensions {dims:?}");
            return Err(malformed(detail));
        };
        count = next;
    }
    Ok(count)
}

fn malformed(detail: impl Into<String>) -> PgFnError {
    PgFnError::MalformedArray {
        detail: detail.into(),
    }
}

impl<'a> IntoIterator for &'a Float8Array {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<Vec<f64>> for Float8Array {
    fn from(values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        Self {
            dims: vec![values.len()],
            lower_bounds: vec![1],
            elements: values,
        }
    }
}
