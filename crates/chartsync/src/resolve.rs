//! Chart total resolution
//!
//! The remote scan undercounts archives, so a sub-collection's total comes
//! from the first source that can vouch for it, in order: local disk scan,
//! admin override, the scan's own claim. Custom collections and manifests
//! without sub-collection summaries are never adjusted.

use std::path::Path;

use crate::overrides::Overrides;
use crate::scanner::TreeScanner;
use crate::types::{Collection, CountSource};

/// What the manifest says about one sub-collection
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    pub collection: &'a Collection,
    pub sub_collection: &'a str,
    /// Declared files under the sub-collection
    pub manifest_file_count: u64,
    /// Sum of their sizes
    pub manifest_file_size: u64,
    /// Where the sub-collection is extracted locally
    pub local_path: &'a Path,
}

/// Data sources a resolver may consult
pub struct Sources<'a> {
    pub scanner: &'a mut TreeScanner,
    pub overrides: &'a Overrides,
}

/// A resolved chart total and its companion size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub item_count: u64,
    pub total_size: u64,
    pub source: CountSource,
}

type Resolver = fn(&ResolveInput<'_>, &mut Sources<'_>) -> Option<Resolution>;

/// Tried in order; the first answer wins
const RESOLVERS: [Resolver; 4] = [unadjusted, local_scan, admin_override, manifest_claim];

/// Resolve the chart total for a sub-collection
pub fn resolve(input: &ResolveInput<'_>, sources: &mut Sources<'_>) -> Resolution {
    RESOLVERS
        .iter()
        .find_map(|resolver| resolver(input, sources))
        .unwrap_or_else(|| raw_counts(input, CountSource::Manifest))
}

fn raw_counts(input: &ResolveInput<'_>, source: CountSource) -> Resolution {
    Resolution {
        item_count: input.manifest_file_count,
        total_size: input.manifest_file_size,
        source,
    }
}

/// Scan size claim, falling back to the declared files
fn manifest_size(input: &ResolveInput<'_>) -> u64 {
    input
        .collection
        .sub_collection(input.sub_collection)
        .and_then(|s| s.claimed_size)
        .unwrap_or(input.manifest_file_size)
}

fn unadjusted(input: &ResolveInput<'_>, _: &mut Sources<'_>) -> Option<Resolution> {
    input
        .collection
        .skips_adjustment()
        .then(|| raw_counts(input, CountSource::Unadjusted))
}

fn local_scan(input: &ResolveInput<'_>, sources: &mut Sources<'_>) -> Option<Resolution> {
    if !input.local_path.is_dir() {
        return None;
    }
    let stats = sources.scanner.unit_stats(input.local_path);
    (stats.item_count > 0).then_some(Resolution {
        item_count: stats.item_count,
        total_size: stats.total_size,
        source: CountSource::LocalScan,
    })
}

fn admin_override(input: &ResolveInput<'_>, sources: &mut Sources<'_>) -> Option<Resolution> {
    let count = sources
        .overrides
        .item_count(&input.collection.name, input.sub_collection)?;
    Some(Resolution {
        item_count: count,
        total_size: manifest_size(input),
        source: CountSource::Override,
    })
}

fn manifest_claim(input: &ResolveInput<'_>, _: &mut Sources<'_>) -> Option<Resolution> {
    let claimed = input
        .collection
        .sub_collection(input.sub_collection)
        .and_then(|s| s.claimed_item_count)
        .unwrap_or(input.manifest_file_count);
    Some(Resolution {
        item_count: claimed,
        total_size: manifest_size(input),
        source: CountSource::Manifest,
    })
}
