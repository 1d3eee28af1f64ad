//! Field extractor registry
//!
//! Maps field names to extractors. Factories are asked in registration
//! order and the first one that accepts a field wins. Built extractors are
//! cached by exact field name; failed lookups are not cached, so a field
//! becomes resolvable as soon as a factory that knows it is added.

use crate::error::{Error, Result};
use inspect_engine::{ExtractorFactory, FieldExtractor, FieldRef, GenericFieldFactory};
use std::collections::HashMap;
use tracing::debug;

/// Factories plus a per-name extractor cache
pub struct ExtractorRegistry {
    factories: Vec<Box<dyn ExtractorFactory>>,
    cache: HashMap<String, Box<dyn FieldExtractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorRegistry {
    /// Create a registry serving the generic engine fields
    pub fn new() -> Self {
        let mut registry = Self {
            factories: Vec::new(),
            cache: HashMap::new(),
        };
        registry.add_factory(Box::new(GenericFieldFactory));
        registry
    }

    /// Append a factory; returns `false` if one with the same id is present
    pub fn add_factory(&mut self, factory: Box<dyn ExtractorFactory>) -> bool {
        let id = factory.id();
        if self.factories.iter().any(|f| f.id() == id) {
            return false;
        }
        debug!("Adding extractor factory {}", id);
        self.factories.push(factory);
        true
    }

    /// Ids of the registered factories, in order
    pub fn factory_ids(&self) -> Vec<String> {
        self.factories.iter().map(|f| f.id()).collect()
    }

    /// Number of cached extractors
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Get the extractor for `name`, building and caching it if needed
    pub fn resolve(&mut self, name: &str) -> Result<&mut Box<dyn FieldExtractor>> {
        if !self.cache.contains_key(name) {
            let extractor = self.build(name)?;
            self.cache.insert(name.to_string(), extractor);
        }
        self.cache
            .get_mut(name)
            .ok_or_else(|| Error::InvalidField(name.to_string()))
    }

    fn build(&self, name: &str) -> Result<Box<dyn FieldExtractor>> {
        let field = FieldRef::parse(name).map_err(|e| Error::InvalidField(e.to_string()))?;
        self.factories
            .iter()
            .find_map(|factory| factory.new_extractor(&field))
            .ok_or_else(|| Error::InvalidField(format!("no extractor for field {}", name)))
    }

    /// Drop every factory and cached extractor
    pub fn clear(&mut self) {
        self.cache.clear();
        self.factories.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspect_engine::{Event, ExtractedValue, FieldValue};

    struct Fixed {
        field: FieldRef,
        value: &'static str,
    }

    impl FieldExtractor for Fixed {
        fn field(&self) -> &FieldRef {
            &self.field
        }

        fn extract(
            &mut self,
            _event: &Event,
            _offsets: bool,
        ) -> anyhow::Result<Vec<ExtractedValue>> {
            let value = FieldValue::String(self.value.to_string());
            Ok(vec![ExtractedValue::new(value)])
        }
    }

    struct FixedFactory {
        id: &'static str,
        value: &'static str,
    }

    impl ExtractorFactory for FixedFactory {
        fn id(&self) -> String {
            self.id.to_string()
        }

        fn new_extractor(&self, field: &FieldRef) -> Option<Box<dyn FieldExtractor>> {
            (field.name == "fixed.value").then(|| {
                Box::new(Fixed {
                    field: field.clone(),
                    value: self.value,
                }) as Box<dyn FieldExtractor>
            })
        }
    }

    fn event() -> Event {
        Event {
            num: 0,
            ts: 0,
            source: "syscall".to_string(),
            event_type: 1,
            data: Vec::new(),
            platform: None,
            source_plugin: None,
        }
    }

    #[test]
    fn test_generic_fields_are_available() {
        let mut registry = ExtractorRegistry::new();
        assert_eq!(registry.factory_ids(), vec!["generic"]);
        let extractor = registry.resolve("evt.num").unwrap();
        assert_eq!(extractor.render(&event()).unwrap().as_deref(), Some("0"));
        assert_eq!(registry.cached(), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let mut registry = ExtractorRegistry::new();
        assert!(matches!(
            registry.resolve("fixed.value"),
            Err(Error::InvalidField(_))
        ));
        assert!(matches!(
            registry.resolve("not a field"),
            Err(Error::InvalidField(_))
        ));
        assert_eq!(registry.cached(), 0);

        registry.add_factory(Box::new(FixedFactory {
            id: "first",
            value: "one",
        }));
        assert!(registry.resolve("fixed.value").is_ok());
    }

    #[test]
    fn test_first_factory_wins() {
        let mut registry = ExtractorRegistry::new();
        assert!(registry.add_factory(Box::new(FixedFactory {
            id: "first",
            value: "one",
        })));
        assert!(registry.add_factory(Box::new(FixedFactory {
            id: "second",
            value: "two",
        })));
        assert!(!registry.add_factory(Box::new(FixedFactory {
            id: "first",
            value: "ignored",
        })));

        let extractor = registry.resolve("fixed.value").unwrap();
        assert_eq!(extractor.render(&event()).unwrap().as_deref(), Some("one"));
        assert_eq!(registry.factory_ids(), vec!["generic", "first", "second"]);
    }
}
