use std::collections::{BTreeMap, HashMap};

use crate::{
    descriptor::ProviderDescriptor,
    diagnostic::{Diagnostic, Sink, TracingSink},
};

/// Entity ID to the short key the rest of the app knows the provider by.
pub type Whitelist = HashMap<String, String>;

/// Key the descriptors by their whitelist entry, logging any that aren't
/// whitelisted.
pub fn map_whitelist(
    descriptors: Vec<ProviderDescriptor>,
    whitelist: &Whitelist,
) -> BTreeMap<String, ProviderDescriptor> {
    map_whitelist_with(descriptors, whitelist, TracingSink)
}

/// Key the descriptors by their whitelist entry.
///
/// Descriptors are visited in order, so when several map to the same key the
/// last one wins. A descriptor whose entity ID has no entry (or an empty key)
/// is left out and reported to `sink`.
#[tracing::instrument(level = "debug", skip(descriptors, whitelist, sink), fields(descriptors = descriptors.len()))]
pub fn map_whitelist_with<S: Sink>(
    descriptors: Vec<ProviderDescriptor>,
    whitelist: &Whitelist,
    mut sink: S,
) -> BTreeMap<String, ProviderDescriptor> {
    descriptors
        .into_iter()
        .fold(BTreeMap::new(), |mut mapped, descriptor| {
            let key = whitelist
                .get(descriptor.entity_id())
                .filter(|key| !key.is_empty())
                .cloned();
            match key {
                Some(key) => {
                    tracing::trace!("Mapping {} to {}", descriptor.entity_id(), key);
                    if mapped.insert(key, descriptor).is_some() {
                        tracing::debug!("Replaced an earlier descriptor with the same key");
                    }
                }
                None => sink.emit(Diagnostic::Unmapped {
                    entity_id: descriptor.entity_id().to_owned(),
                }),
            }
            mapped
        })
}
