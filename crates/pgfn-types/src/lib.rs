//! Value types crossing the pgfn function-call boundary.
//!
//! - [`Varlena`]: self-describing, length-prefixed byte buffers (text).
//! - [`Float8Array`]: dynamically dimensioned `float8[]` values.
//! - [`Point`], [`TimestampTz`]: fixed-size passthrough types.
//! - [`Datum`]: the tagged union every function receives and returns.

pub mod array;
pub mod point;
pub mod timestamp;
pub mod value;
pub mod varlena;

pub use array::{Float8Array, MAX_ARRAY_DIMS};
pub use point::Point;
pub use timestamp::TimestampTz;
pub use value::{Datum, DatumType};
pub use varlena::{HeaderKind, MAX_VARLENA_SIZE, Varlena};

/// Format a `float8` the way the host's output function does.
///
/// Shortest round-trip digits; exponent form (`1e+20`, `1e-05`) outside
/// `[1e-4, 1e15)`; `Infinity`, `-Infinity` and `NaN` spelled out.
pub fn format_float8(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_owned();
    }
    if f.is_infinite() {
        let inf = if f > 0.0 { "Infinity" } else { "-Infinity" };
        return inf.to_owned();
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e15).contains(&abs) {
        let s = format!("{f:e}");
        let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
        let (sign, digits) = match exp.strip_prefix('-') {
            Some(d) => ('-', d),
            None => ('+', exp),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }
    format!("{f}")
}
