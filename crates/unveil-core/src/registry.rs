//! Component registry: open name-to-handler dispatch.
//!
//! The registry is supplied by the host and read-only to the renderer. A
//! missing name is not an error; the renderer falls back to a placeholder
//! (see [`crate::render`]).

use std::collections::HashMap;
use std::fmt;

use crate::document::Attributes;
use crate::render::RenderNode;

/// Render handler for one component name.
///
/// Receives the node's attributes verbatim plus its already-rendered
/// children, and returns the instruction node to emit in their place.
/// Attribute validation belongs to the handler; the core imposes no schema.
pub type ComponentHandler = Box<dyn Fn(&Attributes, Vec<RenderNode>) -> RenderNode + Send + Sync>;

/// Mapping from lower-cased component name to its render handler.
#[derive(Default)]
pub struct ComponentRegistry {
    handlers: HashMap<String, ComponentHandler>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Names are stored lower-cased, so registration
    /// and lookup are case-insensitive.
    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&Attributes, Vec<RenderNode>) -> RenderNode + Send + Sync + 'static,
    {
        self.handlers
            .insert(name.to_lowercase(), Box::new(handler));
    }

    /// Looks up a handler by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&ComponentHandler> {
        self.handlers.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ComponentRegistry")
            .field("names", &names)
            .finish()
    }
}
