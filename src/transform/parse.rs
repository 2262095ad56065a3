//! Textual transform form.
//!
//! The canonical form is ten floats, `"px py pz qx qy qz qw sx sy sz"`.
//! A nine-float form is also accepted on parse, reading the middle three
//! as XYZ Euler angles in degrees.

use crate::math::{Euler, Quaternion, Vector3};
use thiserror::Error;

/// Errors from parsing the textual transform form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformParseError {
    /// The string did not contain 9 or 10 whitespace-separated fields.
    #[error("expected 9 or 10 fields, found {0}")]
    FieldCount(usize),

    /// A field could not be parsed as a float.
    #[error("field {index} is not a number: '{value}'")]
    BadFloat {
        /// Zero-based field index.
        index: usize,
        /// The offending field text.
        value: String,
    },
}

/// Parse the textual form into TRS components.
pub(crate) fn parse_trs(
    s: &str,
) -> Result<(Vector3, Quaternion, Vector3), TransformParseError> {
    let fields: Vec<&str> = s.split_whitespace().collect();
    if fields.len() != 9 && fields.len() != 10 {
        return Err(TransformParseError::FieldCount(fields.len()));
    }

    let mut values = [0f32; 10];
    for (index, field) in fields.iter().enumerate() {
        values[index] = field
            .parse()
            .map_err(|_| TransformParseError::BadFloat {
                index,
                value: (*field).to_string(),
            })?;
    }

    let position = Vector3::new(values[0], values[1], values[2]);
    if fields.len() == 10 {
        let rotation = Quaternion::new(values[3], values[4], values[5], values[6]);
        let scale = Vector3::new(values[7], values[8], values[9]);
        Ok((position, rotation, scale))
    } else {
        // Euler-degrees form, composed Rx * (Ry * Rz)
        let rotation =
            Quaternion::from_euler(&Euler::xyz_degrees(values[3], values[4], values[5]));
        let scale = Vector3::new(values[6], values[7], values[8]);
        Ok((position, rotation, scale))
    }
}

/// Format TRS components as the canonical ten-float form.
pub(crate) fn format_trs(position: &Vector3, rotation: &Quaternion, scale: &Vector3) -> String {
    format!(
        "{} {} {} {} {} {} {} {} {} {}",
        position.x,
        position.y,
        position.z,
        rotation.x,
        rotation.y,
        rotation.z,
        rotation.w,
        scale.x,
        scale.y,
        scale.z,
    )
}
