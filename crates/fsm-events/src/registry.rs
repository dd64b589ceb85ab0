use std::collections::BTreeMap;

use crate::channel::{Channel, DEFAULT_MAX_RAISE_DEPTH};

/// Named library of shared channels.
///
/// Definitions loaded from config refer to shared channels by name; resolving those names
/// through one registry makes every reference land on the same channel.
#[derive(Debug)]
pub struct ChannelRegistry {
    channels: BTreeMap<String, Channel>,
    max_depth: u32,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_RAISE_DEPTH)
    }

    /// Registry whose newly created channels use `max_depth` as their recursion cap.
    pub fn with_max_depth(max_depth: u32) -> Self {
        Self {
            channels: BTreeMap::new(),
            max_depth,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn get_or_create(&mut self, name: &str) -> Channel {
        if let Some(ch) = self.channels.get(name) {
            return ch.clone();
        }
        tracing::debug!(channel = name, "creating shared channel");
        let ch = Channel::with_max_depth(name.to_string(), self.max_depth);
        self.channels.insert(name.to_string(), ch.clone());
        ch
    }

    /// Add an existing channel under its own name, returning the channel it replaced.
    pub fn insert(&mut self, channel: Channel) -> Option<Channel> {
        self.channels.insert(channel.name().to_string(), channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Channel)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_resolves_to_same_channel() {
        let mut registry = ChannelRegistry::new();
        let a = registry.get_or_create("jelly.wandering.update");
        let b = registry.get_or_create("jelly.wandering.update");
        assert!(a.ptr_eq(&b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn created_channels_use_registry_depth() {
        let mut registry = ChannelRegistry::with_max_depth(4);
        assert_eq!(registry.get_or_create("x").max_depth(), 4);
    }

    #[test]
    fn insert_replaces_by_name() {
        let mut registry = ChannelRegistry::new();
        let first = registry.get_or_create("drone.scan");
        let replacement = Channel::new("drone.scan");
        let old = registry.insert(replacement.clone()).unwrap();
        assert!(old.ptr_eq(&first));
        assert!(registry.get("drone.scan").unwrap().ptr_eq(&replacement));
    }
}
