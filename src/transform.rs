use nalgebra::{Rotation3, UnitQuaternion};
use nalgebra_glm as glm;

/// Scale factors smaller than this are treated as zero when removing scale
/// from a matrix
const SCALE_EPSILON: f64 = 1.0e-12;

/// Local transform split into rotation, translation and scale. Everything is
/// kept in double precision since the output tables are `Quat_64` and
/// `Vector4_64`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub rotation: glm::DQuat,
    pub translation: glm::DVec3,
    pub scale: glm::DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation: glm::quat(0.0, 0.0, 0.0, 1.0),
            translation: glm::vec3(0.0, 0.0, 0.0),
            scale: glm::vec3(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    #[must_use]
    pub const fn new(
        rotation: glm::DQuat,
        translation: glm::DVec3,
        scale: glm::DVec3,
    ) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }
}

/// Column major `[x, y, z, w]` conversion for the emitters
#[must_use]
pub fn quat_to_array(q: &glm::DQuat) -> [f64; 4] {
    [q.coords.x, q.coords.y, q.coords.z, q.coords.w]
}

#[must_use]
pub fn vec_to_array(v: &glm::DVec3) -> [f64; 3] {
    [v.x, v.y, v.z]
}

/// Builds the matrix `T * R * S`
#[must_use]
pub fn compose(t: &Transform) -> glm::DMat4 {
    glm::translation(&t.translation)
        * glm::quat_to_mat4(&t.rotation)
        * glm::scaling(&t.scale)
}

/// Splits an affine matrix into rotation, translation and scale. Any shear
/// in the upper 3x3 is discarded. A negative determinant is folded into the
/// X scale.
#[must_use]
pub fn decompose(m: &glm::DMat4) -> Transform {
    let translation = glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)]);

    let mut x_axis = glm::vec3(m[(0, 0)], m[(1, 0)], m[(2, 0)]);
    let y_axis = glm::vec3(m[(0, 1)], m[(1, 1)], m[(2, 1)]);
    let z_axis = glm::vec3(m[(0, 2)], m[(1, 2)], m[(2, 2)]);

    let mut scale =
        glm::vec3(x_axis.norm(), y_axis.norm(), z_axis.norm());
    if glm::dot(&glm::cross(&x_axis, &y_axis), &z_axis) < 0.0 {
        scale.x = -scale.x;
        x_axis = -x_axis;
    }

    let unscale = |axis: glm::DVec3, s: f64| {
        if s.abs() > SCALE_EPSILON {
            axis / s.abs()
        } else {
            axis
        }
    };
    let basis = glm::DMat3::from_columns(&[
        unscale(x_axis, scale.x),
        unscale(y_axis, scale.y),
        unscale(z_axis, scale.z),
    ]);

    // `from_matrix` finds the closest rotation, which absorbs the shear
    let rotation = UnitQuaternion::from_rotation_matrix(
        &Rotation3::from_matrix(&basis),
    )
    .into_inner();

    Transform {
        rotation,
        translation,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1.0e-9;

    fn check_vec(a: &glm::DVec3, b: &glm::DVec3) {
        assert!((a - b).norm() < EPSILON, "{a:?} != {b:?}");
    }

    fn check_quat(a: &glm::DQuat, b: &glm::DQuat) {
        // Either sign is the same rotation
        let d = (a.coords - b.coords).norm().min((a.coords + b.coords).norm());
        assert!(d < EPSILON, "{a:?} != {b:?}");
    }

    #[test]
    fn identity() {
        let t = decompose(&glm::DMat4::identity());
        assert_eq!(t, Transform::default());
    }

    #[test]
    fn compose_then_decompose() {
        let t = Transform::new(
            glm::quat_angle_axis(0.7, &glm::vec3(0.0, 0.6, 0.8)),
            glm::vec3(1.5, -2.0, 3.25),
            glm::vec3(2.0, 0.5, 1.0),
        );
        let out = decompose(&compose(&t));
        check_quat(&out.rotation, &t.rotation);
        check_vec(&out.translation, &t.translation);
        check_vec(&out.scale, &t.scale);
    }

    #[test]
    fn mirrored() {
        let t = Transform::new(
            glm::quat(0.0, 0.0, 0.0, 1.0),
            glm::vec3(0.0, 0.0, 0.0),
            glm::vec3(-1.0, 1.0, 1.0),
        );
        let out = decompose(&compose(&t));
        check_vec(&out.scale, &t.scale);
        check_quat(&out.rotation, &t.rotation);
    }

    #[test]
    fn arrays() {
        let q = glm::quat(0.1, 0.2, 0.3, 0.9);
        assert_eq!(quat_to_array(&q), [0.1, 0.2, 0.3, 0.9]);
        assert_eq!(vec_to_array(&glm::vec3(4.0, 5.0, 6.0)), [4.0, 5.0, 6.0]);
    }
}
