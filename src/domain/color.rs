//! RGBA color and texture value types.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// A color in RGBA. Components are nominally in `[0, 1]` but this is not
/// enforced at construction; arithmetic may leave the range.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Color {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const GRAY: Color = Color::new(0.5, 0.5, 0.5, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn r(&self) -> f64 {
        self.r
    }

    pub fn g(&self) -> f64 {
        self.g
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn set_r(&mut self, r: f64) {
        self.r = r;
    }

    pub fn set_g(&mut self, g: f64) {
        self.g = g;
    }

    pub fn set_b(&mut self, b: f64) {
        self.b = b;
    }

    pub fn set_a(&mut self, a: f64) {
        self.a = a;
    }

    pub fn components(&self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn set_components(&mut self, [r, g, b, a]: [f64; 4]) {
        *self = Self { r, g, b, a };
    }

    /// Binarize the color channels against `limit`; alpha is preserved.
    pub fn threshold(&self, limit: f64) -> Color {
        let cut = |c: f64| if c > limit { 1.0 } else { 0.0 };
        Color::new(cut(self.r), cut(self.g), cut(self.b), self.a)
    }

    /// Average gray level of the color channels.
    pub fn to_gray(&self) -> f64 {
        (self.r + self.g + self.b) / 3.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Color({}, {}, {}, {})",
            self.r, self.g, self.b, self.a
        )
    }
}

impl Add<f64> for Color {
    type Output = Color;

    fn add(self, rhs: f64) -> Self::Output {
        Color::new(self.r + rhs, self.g + rhs, self.b + rhs, self.a + rhs)
    }
}

impl Sub<f64> for Color {
    type Output = Color;

    fn sub(self, rhs: f64) -> Self::Output {
        Color::new(self.r - rhs, self.g - rhs, self.b - rhs, self.a - rhs)
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, rhs: f64) -> Self::Output {
        Color::new(self.r * rhs, self.g * rhs, self.b * rhs, self.a * rhs)
    }
}

impl Div<f64> for Color {
    type Output = Color;

    fn div(self, rhs: f64) -> Self::Output {
        Color::new(self.r / rhs, self.g / rhs, self.b / rhs, self.a / rhs)
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Self) -> Self::Output {
        Color::new(
            self.r + rhs.r,
            self.g + rhs.g,
            self.b + rhs.b,
            self.a + rhs.a,
        )
    }
}

impl Sub for Color {
    type Output = Color;

    fn sub(self, rhs: Self) -> Self::Output {
        Color::new(
            self.r - rhs.r,
            self.g - rhs.g,
            self.b - rhs.b,
            self.a - rhs.a,
        )
    }
}

/// An ordered, growable sequence of colors. Camera images are delivered as
/// textures, one color per pixel column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Texture(Vec<Color>);

impl Texture {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.0.get(index).copied()
    }

    pub fn set(&mut self, index: usize, color: Color) -> bool {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = color;
            true
        } else {
            false
        }
    }

    pub fn push(&mut self, color: Color) {
        self.0.push(color);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.0.iter()
    }
}

impl FromIterator<Color> for Texture {
    fn from_iter<T: IntoIterator<Item = Color>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_default_is_opaque_black() {
        let color = Color::default();
        assert_eq!(color.components(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_components_round_trip() {
        let mut color = Color::default();
        color.set_components([0.1, 0.2, 0.3, 0.4]);
        assert_eq!(color.components(), [0.1, 0.2, 0.3, 0.4]);
    }

    #[rstest]
    #[case(Color::WHITE, Color::new(1.0, 1.0, 1.0, 1.0))]
    #[case(Color::RED + Color::BLUE, Color::new(1.0, 0.0, 1.0, 2.0))]
    #[case(Color::GRAY * 2.0, Color::new(1.0, 1.0, 1.0, 2.0))]
    #[case(Color::WHITE - 0.5, Color::new(0.5, 0.5, 0.5, 0.5))]
    #[case(Color::WHITE / 2.0, Color::new(0.5, 0.5, 0.5, 0.5))]
    fn test_arithmetic(#[case] value: Color, #[case] expected: Color) {
        assert_eq!(value, expected);
    }

    #[test]
    fn test_threshold() {
        let color = Color::new(0.2, 0.6, 0.9, 0.7);
        assert_eq!(color.threshold(0.5), Color::new(0.0, 1.0, 1.0, 0.7));
    }

    #[test]
    fn test_to_gray() {
        assert_abs_diff_eq!(Color::new(0.3, 0.6, 0.9, 1.0).to_gray(), 0.6);
    }

    #[test]
    fn test_texture_indexing_and_push() {
        let mut texture = Texture::new();
        texture.push(Color::RED);
        texture.push(Color::GREEN);
        assert_eq!(texture.len(), 2);
        assert_eq!(texture.get(1), Some(Color::GREEN));
        assert!(texture.set(0, Color::BLUE));
        assert_eq!(texture.get(0), Some(Color::BLUE));
        assert!(!texture.set(5, Color::BLACK));
        assert_eq!(texture.get(5), None);
    }
}
