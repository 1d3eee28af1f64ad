//! Sample plugins for the inspect-harness engine
//!
//! | plugin | capabilities | purpose |
//! |---|---|---|
//! | [`countdown`] | source | batched countdown events with metrics |
//! | [`payload`] | extraction (`countdown`) | payload fields with byte ranges |
//! | [`strict`] | source | rejects every config but `testing` |
//! | [`test_source`] | source + extraction | ticks separated by timeouts |
//! | [`tally`] | parsing + extraction (any source) | per-source event counts |

#![warn(missing_docs)]

use inspect_engine::PluginDescriptor;

pub mod countdown;
pub mod payload;
pub mod strict;
pub mod tally;
pub mod test_source;

pub use countdown::COUNTDOWN;
pub use payload::PAYLOAD;
pub use strict::STRICT;
pub use tally::TALLY;
pub use test_source::TEST_SOURCE;

/// Every bundled plugin
pub fn all() -> [&'static PluginDescriptor; 5] {
    [&COUNTDOWN, &PAYLOAD, &STRICT, &TEST_SOURCE, &TALLY]
}

/// Look a bundled plugin up by name
pub fn find(name: &str) -> Option<&'static PluginDescriptor> {
    all().into_iter().find(|d| d.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_are_unique() {
        let mut names: Vec<_> = all().iter().map(|d| d.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn test_find() {
        assert_eq!(find("dummy").map(|d| d.name), Some("dummy"));
        assert!(find("nope").is_none());
    }
}
