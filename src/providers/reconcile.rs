use crate::providers::family::{family_of, priority_of};
use crate::types::ProviderEntry;
use std::collections::{HashMap, HashSet};

/// Rank of an entry when competing for its family slot: logo first, then
/// deep link.
fn richness(entry: &ProviderEntry) -> (bool, bool) {
    (entry.logo.is_some(), entry.url.is_some())
}

/// Merge provider lists into at most `limit` entries, one per family.
///
/// Lists are consumed in order, so earlier lists win ties against later ones.
/// Within a family the entry with a logo beats one without, then one with a
/// link beats one without, otherwise the first seen stays. The kept entry is
/// renamed to the family and the result is sorted by (priority, family).
pub fn reconcile(lists: &[Vec<ProviderEntry>], limit: usize) -> Vec<ProviderEntry> {
    let mut slots: HashMap<String, ProviderEntry> = HashMap::new();

    for entry in lists.iter().flatten() {
        let family = family_of(&entry.name);
        if family.is_empty() {
            continue;
        }
        match slots.get(&family) {
            Some(current) if richness(entry) <= richness(current) => {}
            _ => {
                slots.insert(family, entry.clone());
            }
        }
    }

    let mut ranked: Vec<(u32, String, ProviderEntry)> = slots
        .into_iter()
        .map(|(family, mut entry)| {
            entry.name = family.clone();
            (priority_of(&family), family, entry)
        })
        .collect();
    ranked.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(_, _, entry)| entry)
        .collect()
}

/// Name-level merge of two lists: all of `primary`, then the entries of
/// `fallback` whose exact name is not already present.
///
/// Unlike [`reconcile`] this does not resolve families, so the result is
/// usually fed back through `reconcile`.
pub fn merge(primary: &[ProviderEntry], fallback: &[ProviderEntry]) -> Vec<ProviderEntry> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged = Vec::with_capacity(primary.len() + fallback.len());
    for entry in primary.iter().chain(fallback) {
        if seen.insert(entry.name.as_str()) {
            merged.push(entry.clone());
        }
    }
    merged
}

/// Split a comma-joined provider list into name-only entries
pub fn parse_provider_list(raw: &str) -> Vec<ProviderEntry> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ProviderEntry::named)
        .collect()
}
