//! Object factory: class keyword to class descriptor registry
//!
//! The factory is built explicitly by the application and handed to the
//! serializer, which uses it to create the objects named in a document.

use crate::graph::class::{ClassDescriptor, ObjectClass};
use crate::graph::store::ObjectGraph;
use crate::io::keyword::is_valid_element_name;
use crate::types::ObjectId;
use std::collections::HashMap;
use std::rc::Rc;

/// Registry creating objects by class keyword
#[derive(Debug, Default, Clone)]
pub struct ObjectFactory {
    classes: HashMap<String, Rc<ClassDescriptor>>,
}

impl ObjectFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register class `T`. The first registration of a keyword wins.
    pub fn register<T: ObjectClass>(&mut self) -> bool {
        self.register_class(ClassDescriptor::of::<T>())
    }

    /// Register a class descriptor.
    ///
    /// Returns false, leaving the factory untouched, if the keyword is
    /// invalid or already registered.
    pub fn register_class(&mut self, class: ClassDescriptor) -> bool {
        let keyword = class.keyword().to_string();
        if !is_valid_element_name(&keyword) {
            crate::log_error!("Refusing to register class with invalid keyword '{}'", keyword);
            return false;
        }
        if self.classes.contains_key(&keyword) {
            crate::log_warn!("Class '{}' is already registered", keyword);
            return false;
        }
        crate::log_debug!("Registered class '{}'", keyword);
        self.classes.insert(keyword, Rc::new(class));
        true
    }

    /// Create an object of the class registered as `keyword`
    pub fn create(&self, graph: &mut ObjectGraph, keyword: &str) -> Option<ObjectId> {
        let class = self.class(keyword)?;
        match graph.create_from_class(class) {
            Ok(object) => Some(object),
            Err(e) => {
                crate::log_error!("Failed to create '{}': {}", keyword, e);
                None
            }
        }
    }

    /// True if `keyword` is registered
    pub fn contains(&self, keyword: &str) -> bool {
        self.classes.contains_key(keyword)
    }

    /// Descriptor registered as `keyword`
    pub fn class(&self, keyword: &str) -> Option<Rc<ClassDescriptor>> {
        self.classes.get(keyword).cloned()
    }

    /// Registered keywords, sorted
    pub fn class_keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = self.classes.keys().cloned().collect();
        keywords.sort();
        keywords
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::class::FieldDeclarations;
    use crate::graph::test_objects::{factory, Container, Item};

    fn no_fields(_fields: &mut FieldDeclarations<'_>) {}

    #[test]
    fn test_first_registration_wins() {
        let mut factory = ObjectFactory::new();
        assert!(factory.is_empty());
        assert!(factory.register::<Item>());
        assert!(!factory.register::<Item>());
        assert!(!factory.register_class(ClassDescriptor::new("Item", &[], no_fields)));
        assert_eq!(factory.len(), 1);
    }

    #[test]
    fn test_invalid_keyword_rejected() {
        let mut factory = ObjectFactory::new();
        assert!(!factory.register_class(ClassDescriptor::new("xmlThing", &[], no_fields)));
        assert!(!factory.register_class(ClassDescriptor::new("has space", &[], no_fields)));
        assert!(factory.is_empty());
    }

    #[test]
    fn test_create_by_keyword() {
        let factory = factory();
        let mut graph = ObjectGraph::new();

        let container = factory.create(&mut graph, "Container").unwrap();
        assert_eq!(graph.object(container).unwrap().class_keyword(), Container::CLASS_KEYWORD);
        assert!(graph.find_field(container, "items").is_some());

        assert!(factory.create(&mut graph, "Missing").is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_runtime_class() {
        // Goal: descriptors assembled at runtime create objects like static classes
        let mut factory = ObjectFactory::new();
        assert!(factory.register_class(ClassDescriptor::new("Plain", &["Item"], no_fields)));
        let mut graph = ObjectGraph::new();
        let plain = factory.create(&mut graph, "Plain").unwrap();
        let handle = graph.object(plain).unwrap();
        assert_eq!(handle.class_inheritance_stack(), ["Plain", "Item", "Object"]);
        assert!(handle.fields().is_empty());
        assert_eq!(factory.class_keywords(), vec!["Plain".to_string()]);
    }
}
