//! Retained SVG document backend.
//!
//! Nodes live in an arena; a handle is an index that stays valid until the
//! node is released, so detaching and re-attaching keeps node identity.
//! Released slots are recycled by later creations.

use crate::overlay::backend::{
    Attributes, CircleAttrs, ContainerAttrs, PolygonAttrs, RenderBackend,
};
use crate::overlay::model::PixelPoint;
use std::fmt::Write as _;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SvgHandle(usize);

#[derive(Debug, Clone)]
struct SvgNode {
    tag: &'static str,
    attributes: Vec<(&'static str, String)>,
    children: Vec<SvgHandle>,
    parent: Option<SvgHandle>,
    released: bool,
}

impl SvgNode {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
            released: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SvgDocument {
    nodes: Vec<SvgNode>,
    free: Vec<usize>,
    attribute_writes: usize,
}

impl Default for SvgDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgDocument {
    /// Creates a document with a root `div` standing in for the board element.
    pub fn new() -> Self {
        Self {
            nodes: vec![SvgNode::new("div")],
            free: Vec::new(),
            attribute_writes: 0,
        }
    }

    pub fn root(&self) -> SvgHandle {
        SvgHandle(0)
    }

    /// Arena slots ever allocated besides the root.
    pub fn created_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Nodes not yet released, besides the root.
    pub fn live_count(&self) -> usize {
        self.created_count() - self.free.len()
    }

    /// Number of `set_attributes` calls that changed at least one attribute.
    pub fn attribute_write_count(&self) -> usize {
        self.attribute_writes
    }

    fn node(&self, handle: SvgHandle) -> Option<&SvgNode> {
        self.nodes.get(handle.0).filter(|node| !node.released)
    }

    pub fn tag(&self, handle: &SvgHandle) -> Option<&'static str> {
        self.node(*handle).map(|node| node.tag)
    }

    pub fn attribute(&self, handle: &SvgHandle, name: &str) -> Option<&str> {
        self.node(*handle)?
            .attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self, handle: &SvgHandle) -> Vec<SvgHandle> {
        self.node(*handle)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    pub fn is_attached(&self, handle: &SvgHandle) -> bool {
        self.node(*handle)
            .is_some_and(|node| node.parent.is_some())
    }

    pub fn to_markup(&self, handle: &SvgHandle) -> String {
        let mut out = String::new();
        self.write_node(&mut out, *handle);
        out
    }

    fn write_node(&self, out: &mut String, handle: SvgHandle) {
        let Some(node) = self.node(handle) else {
            return;
        };
        let _ = write!(out, "<{}", node.tag);
        for (name, value) in &node.attributes {
            let _ = write!(out, " {name}=\"{}\"", escape_attribute(value));
        }
        if node.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &node.children {
            self.write_node(out, *child);
        }
        let _ = write!(out, "</{}>", node.tag);
    }

    fn insert(&mut self, tag: &'static str, attributes: Vec<(&'static str, String)>) -> SvgHandle {
        let mut node = SvgNode::new(tag);
        node.attributes = attributes;
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            return SvgHandle(slot);
        }
        self.nodes.push(node);
        SvgHandle(self.nodes.len() - 1)
    }

    fn unlink(&mut self, handle: SvgHandle) {
        let Some(parent) = self.nodes.get_mut(handle.0).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.retain(|child| *child != handle);
        }
    }
}

impl RenderBackend for SvgDocument {
    type Handle = SvgHandle;

    fn create_container(&mut self, attrs: &ContainerAttrs) -> SvgHandle {
        let mut attributes = vec![("xmlns", SVG_NAMESPACE.to_owned())];
        attributes.extend(svg_attributes(&Attributes::Container(attrs.clone())));
        self.insert("svg", attributes)
    }

    fn create_polygon(&mut self, attrs: &PolygonAttrs) -> SvgHandle {
        self.insert("polygon", svg_attributes(&Attributes::Polygon(attrs.clone())))
    }

    fn create_circle(&mut self, attrs: &CircleAttrs) -> SvgHandle {
        self.insert("circle", svg_attributes(&Attributes::Circle(attrs.clone())))
    }

    fn attach(&mut self, handle: &SvgHandle, container: &SvgHandle) {
        if handle == container || self.node(*container).is_none() || self.node(*handle).is_none() {
            return;
        }
        self.unlink(*handle);
        self.nodes[handle.0].parent = Some(*container);
        self.nodes[container.0].children.push(*handle);
    }

    fn detach(&mut self, handle: &SvgHandle) {
        self.unlink(*handle);
    }

    /// Frees the node's slot. The root and already released nodes are left
    /// alone; children of a released node are detached.
    fn release(&mut self, handle: &SvgHandle) {
        if handle.0 == 0 || self.node(*handle).is_none() {
            return;
        }
        self.unlink(*handle);
        let children = std::mem::take(&mut self.nodes[handle.0].children);
        for child in children {
            if let Some(node) = self.nodes.get_mut(child.0) {
                node.parent = None;
            }
        }
        let node = &mut self.nodes[handle.0];
        node.attributes.clear();
        node.released = true;
        self.free.push(handle.0);
    }

    /// Copies every attribute onto the node, leaving attributes the payload
    /// does not mention untouched.
    fn set_attributes(&mut self, handle: &SvgHandle, attrs: &Attributes) {
        let Some(node) = self.nodes.get_mut(handle.0).filter(|node| !node.released) else {
            return;
        };
        let mut changed = false;
        for (name, value) in svg_attributes(attrs) {
            match node.attributes.iter_mut().find(|(key, _)| *key == name) {
                Some((_, existing)) if *existing == value => {}
                Some((_, existing)) => {
                    *existing = value;
                    changed = true;
                }
                None => {
                    node.attributes.push((name, value));
                    changed = true;
                }
            }
        }
        if changed {
            self.attribute_writes += 1;
        }
    }
}

pub fn svg_attributes(attrs: &Attributes) -> Vec<(&'static str, String)> {
    match attrs {
        Attributes::Container(container) => {
            let rect = container.rect;
            vec![(
                "style",
                format!(
                    "position: sticky; pointer-events: none; z-index: {}; width: {}px; height: {}px; left: {}px; top: {}px",
                    container.layer, rect.width, rect.height, rect.left, rect.top
                ),
            )]
        }
        Attributes::Polygon(polygon) => vec![
            (
                "transform",
                format!(
                    "rotate({} {} {})",
                    polygon.transform.degrees, polygon.transform.pivot.x, polygon.transform.pivot.y
                ),
            ),
            ("points", points_attribute(&polygon.points)),
            ("style", polygon.style.clone()),
        ],
        Attributes::Circle(circle) => vec![
            ("cx", circle.center.x.to_string()),
            ("cy", circle.center.y.to_string()),
            ("r", circle.radius.to_string()),
            ("fill", circle.fill.clone()),
        ],
    }
}

fn points_attribute(points: &[PixelPoint]) -> String {
    let mut out = String::new();
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{},{}", point.x, point.y);
    }
    out
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
