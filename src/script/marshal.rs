//! Conversions between rhai values and domain value types.
//!
//! Scripts never see a dedicated vector type: positions and speeds cross the
//! boundary as plain two-element arrays, color components as four-element
//! arrays. All shape checks run before any element is extracted, so a failed
//! conversion leaves no partial state behind.

use rhai::{Array, Dynamic};

use super::BridgeError;
use crate::domain::{Color, Vector2};

/// Read a numeric scalar, accepting both integer and floating-point values.
pub(crate) fn scalar(value: &Dynamic) -> Option<f64> {
    if value.is_int() {
        value.as_int().ok().map(|v| v as f64)
    } else {
        value.as_float().ok()
    }
}

pub(crate) fn scalar_or_err(value: &Dynamic) -> Result<f64, BridgeError> {
    scalar(value).ok_or_else(|| BridgeError::Conversion {
        expected: "a number",
        found: value.type_name().to_owned(),
    })
}

/// Convert a script value into a [`Vector2`]. Accepts exactly a two-element
/// array of numbers; anything else is rejected before extraction.
pub fn vector_from_dynamic(value: &Dynamic) -> Result<Vector2, BridgeError> {
    const EXPECTED: &str = "a vector as an array of two numbers";
    let reject = || BridgeError::Conversion {
        expected: EXPECTED,
        found: value.type_name().to_owned(),
    };

    let array = value.clone().into_array().map_err(|_| reject())?;
    if array.len() != 2 {
        return Err(BridgeError::Arity {
            expected: 2,
            got: array.len(),
        });
    }
    match (scalar(&array[0]), scalar(&array[1])) {
        (Some(x), Some(y)) => Ok(Vector2::new(x, y)),
        _ => Err(reject()),
    }
}

pub fn vector_to_array(vector: Vector2) -> Array {
    vec![
        Dynamic::from_float(vector.x()),
        Dynamic::from_float(vector.y()),
    ]
}

/// Convert a script value into the four color components. The length is
/// checked first, then every element, before anything is returned.
pub fn components_from_dynamic(value: &Dynamic) -> Result<[f64; 4], BridgeError> {
    let array = value
        .clone()
        .into_array()
        .map_err(|_| BridgeError::Conversion {
            expected: "an array of four numeric components",
            found: value.type_name().to_owned(),
        })?;
    if array.len() != 4 {
        return Err(BridgeError::Arity {
            expected: 4,
            got: array.len(),
        });
    }
    let mut components = [0.0; 4];
    for (slot, element) in components.iter_mut().zip(&array) {
        *slot = scalar_or_err(element)?;
    }
    Ok(components)
}

pub fn components_to_array(color: Color) -> Array {
    color
        .components()
        .into_iter()
        .map(Dynamic::from_float)
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;

    fn array(elements: Vec<Dynamic>) -> Dynamic {
        Dynamic::from_array(elements)
    }

    #[test]
    fn test_vector_from_numeric_pair() {
        let mixed = array(vec![Dynamic::from_int(1), Dynamic::from_float(2.5)]);
        let vector = vector_from_dynamic(&mixed).unwrap();
        assert_abs_diff_eq!(vector.x(), 1.0);
        assert_abs_diff_eq!(vector.y(), 2.5);
    }

    #[rstest]
    #[case::too_short(vec![Dynamic::from_float(1.0)])]
    #[case::too_long(vec![Dynamic::from_float(1.0), Dynamic::from_float(2.0), Dynamic::from_float(3.0)])]
    fn test_vector_rejects_wrong_length(#[case] elements: Vec<Dynamic>) {
        assert!(matches!(
            vector_from_dynamic(&array(elements)),
            Err(BridgeError::Arity { expected: 2, .. })
        ));
    }

    #[rstest]
    #[case::not_a_sequence(Dynamic::from_float(1.0))]
    #[case::string_element(array(vec![Dynamic::from_float(1.0), "2".into()]))]
    #[case::bool_element(array(vec![Dynamic::TRUE, Dynamic::from_float(2.0)]))]
    fn test_vector_rejects_non_numeric(#[case] value: Dynamic) {
        assert!(matches!(
            vector_from_dynamic(&value),
            Err(BridgeError::Conversion { .. })
        ));
    }

    #[test]
    fn test_vector_to_array() {
        let out = vector_to_array(Vector2::new(-1.5, 4.0));
        assert_eq!(out.len(), 2);
        assert_abs_diff_eq!(out[0].as_float().unwrap(), -1.5);
        assert_abs_diff_eq!(out[1].as_float().unwrap(), 4.0);
    }

    #[test]
    fn test_components_round_trip() {
        let source = Color::new(0.1, 0.2, 0.3, 0.4);
        let components = components_from_dynamic(&array(components_to_array(source))).unwrap();
        assert_eq!(components, source.components());
    }

    #[rstest]
    #[case::three(3)]
    #[case::five(5)]
    fn test_components_rejects_wrong_length(#[case] len: usize) {
        let elements = vec![Dynamic::from_float(0.5); len];
        assert!(matches!(
            components_from_dynamic(&array(elements)),
            Err(BridgeError::Arity { expected: 4, got }) if got == len
        ));
    }

    #[test]
    fn test_components_rejects_non_numeric_element() {
        let elements = vec![
            Dynamic::from_float(0.5),
            "red".into(),
            Dynamic::from_float(0.5),
            Dynamic::from_float(0.5),
        ];
        assert!(matches!(
            components_from_dynamic(&array(elements)),
            Err(BridgeError::Conversion { .. })
        ));
    }

    #[test]
    fn test_integers_coerce_to_float() {
        assert_abs_diff_eq!(scalar_or_err(&Dynamic::from_int(3)).unwrap(), 3.0);
        assert!(scalar_or_err(&Dynamic::UNIT).is_err());
    }
}
