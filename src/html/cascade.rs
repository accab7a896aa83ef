//! Per-node style resolution.
//!
//! Each element's properties are merged in a fixed order, later steps
//! overwriting earlier keys: the parent's merged map, then tag, id and
//! class rules, then the inline `style` attribute. Resolved entries are
//! stored in a vector indexed by [`NodeId`] and evicted once the node's
//! subtree has been written, so only the open ancestor chain is held.
//!
//! Every property is inherited except `width`. A node that contributes no
//! declarations of its own shares its parent's `Rc<ParagraphStyle>`.
//! Styles are never mutated after they are stored.

use std::rc::Rc;

use crate::error::{LayoutError, Result};
use crate::font::FontTable;
use crate::model::PageGeometry;
use crate::style::ParagraphStyle;

use super::css::{parse_declarations, PropertyMap, SelectorTables};
use super::dom::{DomTree, NodeId};
use super::style::{style_from_properties, StyleContext};

#[derive(Debug, Clone)]
pub struct CascadeEntry {
    pub properties: PropertyMap,
    pub style: Rc<ParagraphStyle>,
}

pub struct StyleCascade<'a> {
    tables: SelectorTables,
    fonts: &'a FontTable,
    geometry: PageGeometry,
    dpi: f64,
    base: Rc<ParagraphStyle>,
    entries: Vec<Option<CascadeEntry>>,
}

impl<'a> StyleCascade<'a> {
    pub fn new(node_count: usize, geometry: PageGeometry, dpi: f64, fonts: &'a FontTable) -> Result<Self> {
        let ctx = StyleContext { geometry, fonts, dpi };
        let base = Rc::new(style_from_properties(&PropertyMap::new(), &ctx)?);
        Ok(Self {
            tables: SelectorTables::new(),
            fonts,
            geometry,
            dpi,
            base,
            entries: vec![None; node_count],
        })
    }

    /// Merge a stylesheet into the selector tables. Affects only nodes
    /// resolved afterwards.
    pub fn add_stylesheet(&mut self, source: &str) {
        self.tables.add_stylesheet(source);
    }

    pub fn tables(&self) -> &SelectorTables {
        &self.tables
    }

    /// The style every document starts from.
    pub fn base_style(&self) -> Rc<ParagraphStyle> {
        Rc::clone(&self.base)
    }

    fn context(&self) -> StyleContext<'a> {
        StyleContext {
            geometry: self.geometry,
            fonts: self.fonts,
            dpi: self.dpi,
        }
    }

    /// The entry stored for `id` itself, ignoring ancestors.
    pub fn entry(&self, id: NodeId) -> Option<&CascadeEntry> {
        self.entries.get(id.0).and_then(Option::as_ref)
    }

    /// Nearest entry on the node itself or an ancestor.
    fn nearest(&self, tree: &DomTree, id: NodeId) -> Option<&CascadeEntry> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(entry) = self.entry(node) {
                return Some(entry);
            }
            current = tree.parent(node);
        }
        None
    }

    /// Resolve and store the style of element `id`. Non-elements resolve
    /// to their nearest ancestor's style without storing anything.
    pub fn resolve(&mut self, tree: &DomTree, id: NodeId) -> Result<Rc<ParagraphStyle>> {
        if let Some(entry) = self.entry(id) {
            return Ok(Rc::clone(&entry.style));
        }
        let inherited = tree.parent(id).and_then(|parent| self.nearest(tree, parent));
        let (mut properties, parent_style) = match inherited {
            Some(entry) => (entry.properties.clone(), Rc::clone(&entry.style)),
            None => (PropertyMap::new(), Rc::clone(&self.base)),
        };
        let Some(tag) = tree.tag_name(id) else {
            return Ok(parent_style);
        };

        let mut own = PropertyMap::new();
        if let Some(map) = self.tables.tag(tag) {
            own.extend(map.clone());
        }
        if let Some(map) = tree.attribute(id, "id").and_then(|v| self.tables.id(v.trim())) {
            own.extend(map.clone());
        }
        if let Some(classes) = tree.attribute(id, "class") {
            for class in classes.split_whitespace() {
                if let Some(map) = self.tables.class(class) {
                    own.extend(map.clone());
                }
            }
        }
        if let Some(inline) = tree.attribute(id, "style") {
            own.extend(parse_declarations(inline));
        }

        // Block width applies to the element that declares it only.
        let inherited_width = properties.remove("width").is_some();
        let style = if own.is_empty() && !inherited_width {
            parent_style
        } else {
            properties.extend(own);
            Rc::new(style_from_properties(&properties, &self.context())?)
        };
        log::trace!("resolved <{}> (node {})", tag, id.0);
        if let Some(slot) = self.entries.get_mut(id.0) {
            *slot = Some(CascadeEntry {
                properties,
                style: Rc::clone(&style),
            });
        }
        Ok(style)
    }

    /// Style in effect at `id`: its own entry or the nearest ancestor's,
    /// falling back to the base style.
    pub fn style_of(&self, tree: &DomTree, id: NodeId) -> Rc<ParagraphStyle> {
        self.nearest(tree, id)
            .map(|entry| Rc::clone(&entry.style))
            .unwrap_or_else(|| Rc::clone(&self.base))
    }

    pub fn properties_of(&self, tree: &DomTree, id: NodeId) -> Option<&PropertyMap> {
        self.nearest(tree, id).map(|entry| &entry.properties)
    }

    /// Style for closing out `id`. Having no entry on the node or any
    /// ancestor means enter and exit events were unbalanced.
    pub fn style_for_close(&self, tree: &DomTree, id: NodeId) -> Result<Rc<ParagraphStyle>> {
        self.nearest(tree, id)
            .map(|entry| Rc::clone(&entry.style))
            .ok_or_else(|| LayoutError::MissingStyle {
                node: id.0,
                tag: tree.tag_name(id).unwrap_or("#text").to_string(),
            })
    }

    pub fn evict(&mut self, id: NodeId) {
        if let Some(slot) = self.entries.get_mut(id.0) {
            *slot = None;
        }
    }

    /// Number of nodes currently holding an entry.
    pub fn live_entries(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}
