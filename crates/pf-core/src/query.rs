//! Batched `listMetadata` scheduling: plan construction, the two query
//! rounds, and the ordered result buckets.

use std::collections::{HashMap, HashSet};

use futures::future::try_join_all;
use packforge_session::SessionManager;
use packforge_soap::{ListQuery, MetadataClient, MetadataItem, MetadataType, MAX_LIST_QUERIES};
use tracing::{debug, warn};

use crate::classify::FolderMap;
use crate::error::Result;
use crate::filter;
use crate::options::BuilderOptions;

/// An ordered set of query batches, each within the API's per-call cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    pub batches: Vec<Vec<ListQuery>>,
}

impl QueryPlan {
    /// Plan the first query round for the itemized types.
    ///
    /// Folder-contained types are queried under their synthetic folder-type
    /// names; everything else under its own name. Every type lands in
    /// exactly one batch.
    pub fn for_types(types_to_query: &[MetadataType], folder_map: &FolderMap) -> Self {
        let queries = types_to_query
            .iter()
            .map(|meta| {
                let query_type = if meta.in_folder {
                    folder_map
                        .folder_type(&meta.xml_name)
                        .map(str::to_string)
                        .unwrap_or_else(|| crate::classify::synthetic_folder_type(&meta.xml_name))
                } else {
                    meta.xml_name.clone()
                };
                ListQuery::of_type(query_type)
            })
            .collect();

        Self::chunk(queries)
    }

    /// Chunk a flat query list into batches of at most [`MAX_LIST_QUERIES`].
    pub fn chunk(queries: Vec<ListQuery>) -> Self {
        let batches = queries
            .chunks(MAX_LIST_QUERIES)
            .map(|chunk| chunk.to_vec())
            .collect();
        Self { batches }
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Itemized list results, bucketed per type in first-discovery order.
///
/// Every queried type gets a bucket up front, even when nothing comes
/// back, so the serializer can tell "requested but empty" (skip) from
/// "never requested". Duplicate full names within a type are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemizedTypes {
    order: Vec<String>,
    buckets: HashMap<String, Vec<MetadataItem>>,
    seen: HashSet<(String, String)>,
}

impl ItemizedTypes {
    /// Ensure a bucket exists for the given type.
    pub fn init_type(&mut self, type_name: &str) {
        if !self.buckets.contains_key(type_name) {
            self.order.push(type_name.to_string());
            self.buckets.insert(type_name.to_string(), Vec::new());
        }
    }

    /// Append an item to its type bucket; returns false when the item is a
    /// duplicate or its type was never requested.
    pub fn push(&mut self, item: MetadataItem) -> bool {
        let Some(bucket) = self.buckets.get_mut(&item.item_type) else {
            warn!(item_type = %item.item_type, full_name = %item.full_name,
                "dropping item of unrequested type");
            return false;
        };

        let key = (item.item_type.clone(), item.full_name.clone());
        if !self.seen.insert(key) {
            return false;
        }

        bucket.push(item);
        true
    }

    /// Buckets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MetadataItem])> {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.buckets[name].as_slice()))
    }

    /// Members of one type, if the type was requested.
    pub fn get(&self, type_name: &str) -> Option<&[MetadataItem]> {
        self.buckets.get(type_name).map(Vec::as_slice)
    }

    /// True when no bucket holds any item.
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }
}

/// Executes a query plan through the session layer.
pub struct QueryScheduler<'a> {
    manager: &'a SessionManager,
    api_version: &'a str,
}

impl<'a> QueryScheduler<'a> {
    pub fn new(manager: &'a SessionManager, api_version: &'a str) -> Self {
        Self {
            manager,
            api_version,
        }
    }

    /// Run the itemized queries: round 1 lists every queued type (folder
    /// types under their folder-type names), round 2 lists the contents of
    /// every folder discovered in round 1. Non-folder items from both
    /// rounds pass the managed filter into the result buckets.
    pub async fn run(
        &self,
        types_to_query: &[MetadataType],
        folder_map: &FolderMap,
        options: &BuilderOptions,
    ) -> Result<ItemizedTypes> {
        let mut itemized = ItemizedTypes::default();
        for meta in types_to_query {
            itemized.init_type(&meta.xml_name);
        }

        let plan = QueryPlan::for_types(types_to_query, folder_map);
        if plan.is_empty() {
            return Ok(itemized);
        }

        debug!(batches = plan.batches.len(), "running query round 1");
        let round_one = self.run_round(&plan).await?;

        // Round-1 items whose type is a folder-type name are folder names,
        // not content; they seed round 2.
        let mut folder_queries = Vec::new();
        for item in round_one {
            if let Some(content_type) = folder_map.content_type(&item.item_type) {
                folder_queries.push(ListQuery::in_folder(content_type, item.full_name));
            } else if filter::include_item(&item, options) {
                itemized.push(item);
            }
        }

        if !folder_queries.is_empty() {
            let folder_plan = QueryPlan::chunk(folder_queries);
            debug!(batches = folder_plan.batches.len(), "running query round 2");
            for item in self.run_round(&folder_plan).await? {
                if filter::include_item(&item, options) {
                    itemized.push(item);
                }
            }
        }

        Ok(itemized)
    }

    /// Dispatch every batch of one round concurrently inside a single
    /// session action, so an invalid-session fault anywhere costs one
    /// coordinated re-login and one retry of the whole round.
    async fn run_round(&self, plan: &QueryPlan) -> Result<Vec<MetadataItem>> {
        let api_version = self.api_version;
        let batches = &plan.batches;

        let results = self
            .manager
            .with_session(|session| async move {
                let client =
                    MetadataClient::from_parts(session.metadata_url, session.session_id);
                let calls = batches
                    .iter()
                    .map(|batch| client.list_metadata(batch, api_version));
                try_join_all(calls).await
            })
            .await?;

        Ok(results.into_iter().flatten().collect())
    }
}
