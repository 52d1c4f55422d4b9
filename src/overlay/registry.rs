use crate::overlay::arrow::build_arrow_between;
use crate::overlay::backend::{Attributes, CircleAttrs, PolygonAttrs, RenderBackend};
use crate::overlay::error::OverlayError;
use crate::overlay::model::{ShapeKind, ShapeSpec};
use crate::overlay::projector::Projection;
use hashlink::LinkedHashMap;

pub const DEFAULT_VISUAL_STYLE: &str = "fill: mediumseagreen; opacity: 0.8";
pub const MARKER_RADIUS: f64 = 1.0;
pub const MARKER_FILL: &str = "black";

/// Identifier of a placed shape. Never reused within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u64);

#[derive(Debug)]
struct ShapeEntry<H> {
    spec: ShapeSpec,
    primitive: H,
    applied: Attributes,
    attached: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct ReprojectReport {
    pub updated: Vec<ShapeId>,
    pub unchanged: Vec<ShapeId>,
    pub failed: Vec<(ShapeId, OverlayError)>,
}

impl ReprojectReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Placed shapes in insertion (paint) order, each bound to one primitive.
#[derive(Debug)]
pub struct ShapeRegistry<H> {
    entries: LinkedHashMap<ShapeId, ShapeEntry<H>>,
    next_id: u64,
}

impl<H> Default for ShapeRegistry<H> {
    fn default() -> Self {
        Self {
            entries: LinkedHashMap::new(),
            next_id: 0,
        }
    }
}

impl<H: Clone + PartialEq> ShapeRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of_kind(&self, kind: ShapeKind) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.spec.kind() == kind)
            .count()
    }

    pub fn ids(&self) -> Vec<ShapeId> {
        self.entries.keys().copied().collect()
    }

    pub fn spec(&self, id: ShapeId) -> Option<&ShapeSpec> {
        self.entries.get(&id).map(|entry| &entry.spec)
    }

    pub fn primitive(&self, id: ShapeId) -> Option<&H> {
        self.entries.get(&id).map(|entry| &entry.primitive)
    }

    /// Whether the shape's primitive currently sits in the container. A shape
    /// whose endpoints stopped resolving stays registered but detached.
    pub fn is_attached(&self, id: ShapeId) -> bool {
        self.entries.get(&id).is_some_and(|entry| entry.attached)
    }

    pub fn add<B>(
        &mut self,
        backend: &mut B,
        container: &H,
        projection: &Projection,
        spec: ShapeSpec,
    ) -> Result<ShapeId, OverlayError>
    where
        B: RenderBackend<Handle = H>,
    {
        let attrs = synthesize(&spec, projection)?;
        let primitive = backend.create(&attrs);
        backend.attach(&primitive, container);

        let id = ShapeId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            ShapeEntry {
                spec,
                primitive,
                applied: attrs,
                attached: true,
            },
        );
        Ok(id)
    }

    pub fn remove<B>(&mut self, backend: &mut B, id: ShapeId) -> bool
    where
        B: RenderBackend<Handle = H>,
    {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        backend.release(&entry.primitive);
        true
    }

    pub fn remove_all_of_kind<B>(&mut self, backend: &mut B, kind: ShapeKind) -> usize
    where
        B: RenderBackend<Handle = H>,
    {
        let doomed: Vec<ShapeId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.spec.kind() == kind)
            .map(|(id, _)| *id)
            .collect();
        for id in &doomed {
            self.remove(backend, *id);
        }
        doomed.len()
    }

    /// Drops every entry without touching the backend; used once the
    /// container itself has been detached.
    pub fn forget_all(&mut self) {
        self.entries.clear();
    }

    /// Rebuilds every shape against `projection`, updating primitives in place.
    pub fn reproject_all<B>(
        &mut self,
        backend: &mut B,
        container: &H,
        projection: &Projection,
    ) -> ReprojectReport
    where
        B: RenderBackend<Handle = H>,
    {
        let mut report = ReprojectReport::default();
        for (id, entry) in self.entries.iter_mut() {
            match synthesize(&entry.spec, projection) {
                Ok(attrs) => {
                    if attrs != entry.applied {
                        backend.set_attributes(&entry.primitive, &attrs);
                        entry.applied = attrs;
                        report.updated.push(*id);
                    } else {
                        report.unchanged.push(*id);
                    }
                    if !entry.attached {
                        backend.attach(&entry.primitive, container);
                        entry.attached = true;
                    }
                }
                Err(err) => {
                    tracing::warn!(?id, %err, "shape no longer resolves; detaching");
                    if entry.attached {
                        backend.detach(&entry.primitive);
                        entry.attached = false;
                    }
                    report.failed.push((*id, err));
                }
            }
        }
        report
    }
}

fn synthesize(spec: &ShapeSpec, projection: &Projection) -> Result<Attributes, OverlayError> {
    match spec {
        ShapeSpec::Arrow { from, to, style } => {
            let geometry = build_arrow_between(projection, from, to, style)?;
            let visual = style.visual_style.as_deref().unwrap_or(DEFAULT_VISUAL_STYLE);
            Ok(Attributes::Polygon(PolygonAttrs::from_arrow(geometry, visual)))
        }
        ShapeSpec::Marker { at } => Ok(Attributes::Circle(CircleAttrs {
            center: *at,
            radius: MARKER_RADIUS,
            fill: MARKER_FILL.to_owned(),
        })),
    }
}
