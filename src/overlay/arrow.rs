use crate::overlay::error::OverlayError;
use crate::overlay::model::{ArrowStyle, Endpoint, PixelPoint};
use crate::overlay::projector::Projection;

pub const ARROW_VERTEX_COUNT: usize = 7;

/// Arrow outline in its unrotated frame plus the rotation that aims it.
///
/// The template is drawn pointing up from the tail point; rotating it by
/// `rotation_degrees` around `rotation_pivot` makes the tip land on the target.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowGeometry {
    /// Tail-left, shaft-left, head-left shoulder, tip, head-right shoulder,
    /// shaft-right, tail-right.
    pub vertices: Vec<PixelPoint>,
    pub rotation_degrees: f64,
    pub rotation_pivot: PixelPoint,
}

impl ArrowGeometry {
    pub fn tip(&self) -> Option<PixelPoint> {
        self.vertices.get(3).copied()
    }

    /// Vertices with the rotation applied, for backends without transforms.
    pub fn rotated_vertices(&self) -> Vec<PixelPoint> {
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
        let pivot = self.rotation_pivot;
        self.vertices
            .iter()
            .map(|point| {
                let dx = point.x - pivot.x;
                let dy = point.y - pivot.y;
                PixelPoint::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
            })
            .collect()
    }
}

pub fn build_arrow(
    from: PixelPoint,
    to: PixelPoint,
    cell_size: f64,
    style: &ArrowStyle,
) -> ArrowGeometry {
    let scale = cell_size / 100.0;
    let line_width = style.line_width * scale;
    let arrowhead_width = style.arrowhead_width * scale;
    let arrowhead_height = style.arrowhead_height * scale;
    let tail_inset = style.tail_inset * scale;

    let distance = from.distance_to(to);
    let angle = (from.y - to.y).atan2(from.x - to.x);

    let tail_y = from.y - tail_inset;
    let tip_y = from.y - distance;
    let shoulder_y = tip_y + arrowhead_height;

    let vertices = vec![
        PixelPoint::new(from.x - line_width / 2.0, tail_y),
        PixelPoint::new(from.x - line_width / 2.0, shoulder_y),
        PixelPoint::new(from.x - arrowhead_width / 2.0, shoulder_y),
        PixelPoint::new(from.x, tip_y),
        PixelPoint::new(from.x + arrowhead_width / 2.0, shoulder_y),
        PixelPoint::new(from.x + line_width / 2.0, shoulder_y),
        PixelPoint::new(from.x + line_width / 2.0, tail_y),
    ];

    ArrowGeometry {
        vertices,
        rotation_degrees: angle.to_degrees() - 90.0,
        rotation_pivot: from,
    }
}

/// Resolves both endpoints against `projection` and builds the arrow between
/// their cell centres.
pub fn build_arrow_between(
    projection: &Projection,
    from: &Endpoint,
    to: &Endpoint,
    style: &ArrowStyle,
) -> Result<ArrowGeometry, OverlayError> {
    let from = projection.center_of(from)?;
    let to = projection.center_of(to)?;
    Ok(build_arrow(from, to, projection.cell_size(), style))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::model::{GridSpec, HostRect, Orientation};
    use crate::overlay::projector::project;

    fn assert_close(a: PixelPoint, b: PixelPoint) {
        assert!(
            (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn straight_up_needs_no_rotation() {
        let from = PixelPoint::new(100.0, 100.0);
        let to = PixelPoint::new(100.0, 0.0);
        let arrow = build_arrow(from, to, 100.0, &ArrowStyle::default());

        let expected = (from.y - to.y).atan2(from.x - to.x).to_degrees() - 90.0;
        assert_eq!(arrow.rotation_degrees, expected);
        assert!(arrow.rotation_degrees.abs() < 1e-12);
        assert_eq!(arrow.rotation_pivot, from);
    }

    #[test]
    fn default_template_matches_cell_scaled_dimensions() {
        let from = PixelPoint::new(100.0, 300.0);
        let to = PixelPoint::new(100.0, 100.0);
        let arrow = build_arrow(from, to, 100.0, &ArrowStyle::default());

        assert_eq!(
            arrow.vertices,
            vec![
                PixelPoint::new(92.5, 280.0),
                PixelPoint::new(92.5, 145.0),
                PixelPoint::new(72.5, 145.0),
                PixelPoint::new(100.0, 100.0),
                PixelPoint::new(127.5, 145.0),
                PixelPoint::new(107.5, 145.0),
                PixelPoint::new(107.5, 280.0),
            ]
        );
    }

    #[test]
    fn proportions_scale_with_cell_size() {
        let from = PixelPoint::new(0.0, 0.0);
        let to = PixelPoint::new(0.0, -400.0);
        let small = build_arrow(from, to, 50.0, &ArrowStyle::default());
        let large = build_arrow(from, to, 200.0, &ArrowStyle::default());

        let width = |arrow: &ArrowGeometry| arrow.vertices[6].x - arrow.vertices[0].x;
        assert_eq!(width(&small), 7.5);
        assert_eq!(width(&large), 30.0);
    }

    #[test]
    fn rotated_tip_lands_on_target() {
        let from = PixelPoint::new(150.0, 650.0);
        for to in [
            PixelPoint::new(450.0, 350.0),
            PixelPoint::new(50.0, 650.0),
            PixelPoint::new(150.0, 750.0),
            PixelPoint::new(750.0, 50.0),
        ] {
            let arrow = build_arrow(from, to, 100.0, &ArrowStyle::default());
            assert_eq!(arrow.vertices.len(), ARROW_VERTEX_COUNT);
            assert_close(arrow.rotated_vertices()[3], to);
        }
    }

    #[test]
    fn zero_length_arrow_collapses_without_numeric_error() {
        let point = PixelPoint::new(50.0, 50.0);
        let arrow = build_arrow(point, point, 100.0, &ArrowStyle::default());

        assert_eq!(arrow.vertices.len(), ARROW_VERTEX_COUNT);
        assert_eq!(arrow.tip(), Some(point));
        assert!(arrow.rotation_degrees.is_finite());
        assert!(arrow
            .rotated_vertices()
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn endpoints_resolve_through_the_projection() {
        let grid = GridSpec::new(8, 8, Orientation::Primary).unwrap();
        let projection = project(HostRect::new(800.0, 800.0, 0.0, 0.0), grid).unwrap();

        let arrow =
            build_arrow_between(&projection, &"e2".into(), &"e4".into(), &ArrowStyle::default())
                .unwrap();
        assert_eq!(arrow.rotation_pivot, PixelPoint::new(450.0, 650.0));
        assert_eq!(arrow.tip(), Some(PixelPoint::new(450.0, 450.0)));

        assert_eq!(
            build_arrow_between(&projection, &"e2".into(), &"e9".into(), &ArrowStyle::default()),
            Err(OverlayError::unknown_address("e9"))
        );
    }

    #[test]
    fn tip_is_absent_on_truncated_outline() {
        let arrow = ArrowGeometry {
            vertices: vec![PixelPoint::new(0.0, 0.0); 2],
            rotation_degrees: 0.0,
            rotation_pivot: PixelPoint::new(0.0, 0.0),
        };
        assert_eq!(arrow.tip(), None);
    }
}
