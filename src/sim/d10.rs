//! D10 body geometry
//!
//! The die is a pentagonal bipyramid: five equator vertices plus two apices,
//! ten triangular faces. Upper faces carry 1..=5, lower faces 10..=6.

use glam::Vec3;

/// Number of vertices on the hull
pub const D10_VERTEX_COUNT: usize = 7;
/// Number of faces
pub const D10_FACE_COUNT: usize = 10;

/// Local-frame hull and face table for one d10
#[derive(Debug, Clone, PartialEq)]
pub struct D10Geometry {
    /// Equator radius
    pub radius: f32,
    /// Apex height above/below the equator
    pub apex: f32,
    /// Hull vertices: ring 0..5, top apex, bottom apex
    pub vertices: [Vec3; D10_VERTEX_COUNT],
    /// Outward unit normal and face value for each face
    pub faces: [(Vec3, u8); D10_FACE_COUNT],
    /// Face centroids (label anchors for renderers)
    pub centers: [Vec3; D10_FACE_COUNT],
}

impl Default for D10Geometry {
    fn default() -> Self {
        Self::new(1.0, 1.2)
    }
}

impl D10Geometry {
    pub fn new(radius: f32, apex: f32) -> Self {
        let top = Vec3::new(0.0, apex, 0.0);
        let bottom = Vec3::new(0.0, -apex, 0.0);

        let mut ring = [Vec3::ZERO; 5];
        for (i, v) in ring.iter_mut().enumerate() {
            let a = i as f32 * std::f32::consts::TAU / 5.0;
            *v = Vec3::new(a.cos() * radius, 0.0, a.sin() * radius);
        }

        let mut faces = [(Vec3::Y, 1u8); D10_FACE_COUNT];
        let mut centers = [Vec3::ZERO; D10_FACE_COUNT];

        for i in 0..5 {
            let a = ring[i];
            let b = ring[(i + 1) % 5];

            let (n, c) = outward_face(top, a, b);
            faces[i] = (n, i as u8 + 1);
            centers[i] = c;

            let (n, c) = outward_face(bottom, b, a);
            faces[5 + i] = (n, 10 - i as u8);
            centers[5 + i] = c;
        }

        let vertices = [ring[0], ring[1], ring[2], ring[3], ring[4], top, bottom];

        Self {
            radius,
            apex,
            vertices,
            faces,
            centers,
        }
    }

    /// Radius of the smallest origin-centered sphere enclosing the hull
    pub fn bounding_radius(&self) -> f32 {
        self.radius.max(self.apex)
    }

    /// Local normal of the face carrying `value`
    pub fn normal_of(&self, value: u8) -> Option<Vec3> {
        self.faces.iter().find(|(_, v)| *v == value).map(|(n, _)| *n)
    }
}

/// Unit normal pointing away from the body center, plus the face centroid
fn outward_face(a: Vec3, b: Vec3, c: Vec3) -> (Vec3, Vec3) {
    let center = (a + b + c) / 3.0;
    let n = (b - a).cross(c - a).normalize_or_zero();
    if n.dot(center) < 0.0 {
        (-n, center)
    } else {
        (n, center)
    }
}
