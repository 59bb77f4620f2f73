//! Managed-component inclusion policy.

use packforge_soap::MetadataItem;

use crate::options::{BuilderOptions, ManagedExclusion};

/// Decide whether a listed item belongs in the manifest.
///
/// Exactly one of four rules applies, evaluated in order:
/// 1. unmanaged items (no manageable state, or literally `unmanaged`) are
///    always included;
/// 2. with the blanket exclusion flag, managed items are excluded unless
///    their type is in the `include_managed` override list;
/// 3. with a type-list exclusion naming the item's type, managed items are
///    excluded regardless of the override list;
/// 4. every other managed item is included.
pub fn include_item(item: &MetadataItem, options: &BuilderOptions) -> bool {
    let managed = item
        .manageable_state
        .as_deref()
        .is_some_and(|state| state != "unmanaged");
    if !managed {
        return true;
    }

    match &options.exclude_managed {
        ManagedExclusion::Flag(true) => options
            .include_managed
            .iter()
            .any(|name| name == &item.item_type),
        ManagedExclusion::Types(types) if types.iter().any(|name| name == &item.item_type) => {
            false
        }
        _ => true,
    }
}
