use std::fmt;

use crate::format_float8;

/// A two-component `point`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", format_float8(self.x), format_float8(self.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_host_output() {
        assert_eq!(Point::new(1.0, -2.5).to_string(), "(1,-2.5)");
        assert_eq!(Point::new(f64::INFINITY, 0.0).to_string(), "(Infinity,0)");
    }
}
