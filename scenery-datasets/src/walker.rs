//! Dataset graph walker.
//!
//! Resolves a typed path through the dataset graph: starting from one record,
//! each entry of the path names the `ref` field to follow to reach the next
//! record. The store has no native graph queries, so the walk explores the
//! graph breadth-first in process, one batch load per depth, and then keeps
//! only the records that lie on the requested chain.

use crate::{WalkError, WalkResult};
use scenery_model::{Dataset, DatasetField};
use scenery_store::{Context, DatasetLoader};
use scenery_types::{DatasetFieldId, DatasetId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Default bound on the number of hops a single path may take.
pub const DEFAULT_MAX_PATH_LENGTH: usize = 16;

/// Resolves a chain of dataset records from a start record and a field path.
pub trait DatasetPathResolver {
    /// Returns `[start, hop1, ..., hopN]` for a path of `N` fields.
    /// An empty path returns just the start record.
    fn resolve_path(&self, ctx: &Context, start: DatasetId, path: &[DatasetFieldId]) -> WalkResult<Vec<Dataset>>;
}

/// In-process breadth-first path resolver over any [`DatasetLoader`].
pub struct GraphWalker<'a, L: ?Sized> {
    loader: &'a L,
    max_path_length: usize,
}

impl<'a, L: DatasetLoader + ?Sized> GraphWalker<'a, L> {
    pub fn new(loader: &'a L) -> Self {
        Self {
            loader,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
        }
    }

    pub fn with_max_path_length(mut self, max: usize) -> Self {
        self.max_path_length = max;
        self
    }

    pub fn max_path_length(&self) -> usize {
        self.max_path_length
    }

    fn load_start(&self, ctx: &Context, start: DatasetId) -> WalkResult<Dataset> {
        match self.loader.load_dataset(ctx, start) {
            Ok(record) if ctx.can_read(record.scene) => Ok(record),
            Ok(_) => Err(WalkError::StartNotFound(start)),
            Err(e) if e.is_not_found() => Err(WalkError::StartNotFound(start)),
            Err(e) => Err(e.into()),
        }
    }

    /// Breadth-first exploration along every `ref` edge, starting at `first`
    /// (depth 1) and stopping at `max_depth`. Returns the records visited at
    /// each depth; `levels[d - 1]` holds depth `d`. A record reachable at
    /// several depths appears at each of them, but is loaded only once.
    fn explore(&self, ctx: &Context, first: DatasetId, max_depth: usize) -> WalkResult<Vec<Vec<Dataset>>> {
        let mut loaded: HashMap<DatasetId, Vec<Dataset>> = HashMap::new();
        let mut levels = Vec::with_capacity(max_depth);
        let mut frontier = vec![first];

        for depth in 1..=max_depth {
            let mut queued = HashSet::new();
            frontier.retain(|id| queued.insert(*id));

            let missing: Vec<DatasetId> = frontier
                .iter()
                .copied()
                .filter(|id| !loaded.contains_key(id))
                .collect();
            if !missing.is_empty() {
                ctx.check()?;
                let records = self.loader.load_datasets(ctx, &missing)?;
                debug!(
                    "Loaded {} of {} datasets at depth {}",
                    records.len(),
                    missing.len(),
                    depth
                );
                for id in &missing {
                    loaded.entry(*id).or_default();
                }
                for record in records {
                    if ctx.can_read(record.scene) {
                        loaded.entry(record.id).or_default().push(record);
                    }
                }
            }

            let level: Vec<Dataset> = frontier
                .iter()
                .filter_map(|id| loaded.get(id))
                .flatten()
                .cloned()
                .collect();

            frontier = if depth < max_depth {
                level
                    .iter()
                    .flat_map(|record| record.ref_targets().map(|(_, target)| target))
                    .collect()
            } else {
                Vec::new()
            };
            levels.push(level);
        }
        Ok(levels)
    }
}

impl<L: DatasetLoader + ?Sized> DatasetPathResolver for GraphWalker<'_, L> {
    fn resolve_path(&self, ctx: &Context, start: DatasetId, path: &[DatasetFieldId]) -> WalkResult<Vec<Dataset>> {
        if path.len() > self.max_path_length {
            return Err(WalkError::PathTooLong {
                len: path.len(),
                max: self.max_path_length,
            });
        }
        ctx.check()?;
        let start_record = self.load_start(ctx, start)?;

        let Some(&first_field) = path.first() else {
            return Ok(vec![start_record]);
        };
        let first = start_record
            .ref_target(first_field)
            .ok_or(WalkError::NotARef {
                dataset: start,
                field: first_field,
            })?;

        let levels = self.explore(ctx, first, path.len())?;

        let mut chain = Vec::with_capacity(path.len() + 1);
        chain.push(start_record);
        let mut expected = first;
        for (index, level) in levels.into_iter().enumerate() {
            let depth = index + 1;
            let next_field = path.get(depth).copied();
            let mut survivors: Vec<Dataset> = level
                .into_iter()
                .filter(|record| record.id == expected)
                .filter(|record| match next_field {
                    Some(field) => record.field(field).is_some_and(DatasetField::is_ref),
                    None => true,
                })
                .collect();

            let record = match survivors.len() {
                0 => return Err(WalkError::BrokenPath { depth }),
                1 => survivors.remove(0),
                candidates => return Err(WalkError::AmbiguousPath { depth, candidates }),
            };
            if let Some(field) = next_field {
                expected = record
                    .ref_target(field)
                    .ok_or(WalkError::BrokenPath { depth: depth + 1 })?;
            }
            chain.push(record);
        }

        debug!("Resolved {}-hop path from dataset {}", path.len(), start);
        Ok(chain)
    }
}
