//! Banked experience resolution
//!
//! A resolution pass is a pure function of the catalog, the owned items and
//! the link registry. It holds no state between passes and always rebuilds
//! the whole mapping:
//! 1. Collect every owned catalog item
//! 2. Walk each item's conversion chain, adding every item it passes
//!    through to the tracked set
//! 3. Price each tracked item at owned quantity x experience along its chain
//!
//! A chain step is taken only when it is unambiguous (one candidate) or a
//! link decides it. Cycles and over-long chains are catalog corruption and
//! abort the pass.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::catalog::{Activity, Catalog, Item};
use crate::containers::OwnedItems;
use crate::core::config::BankedConfig;
use crate::core::types::{ActivityId, Experience, ItemId, Quantity, Skill};
use crate::links::LinkRegistry;
use crate::resolver::banked::{BankedItem, BankedItemMap, Resolution, SkillExperience};

/// Data-integrity failures; any of these aborts the pass
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Conversion cycle starting at item {item}: {path:?}")]
    CycleDetected { item: ItemId, path: Vec<ItemId> },
    #[error("Conversion chain from item {item} exceeds {limit} steps")]
    ChainTooDeep { item: ItemId, limit: usize },
    #[error("Experience overflow for item {0}")]
    Overflow(ItemId),
}

/// How a single item converts, before following its output
enum Step<'a> {
    Terminal,
    Single(&'a Activity),
    Linked(&'a Activity),
    Unresolved(Vec<ActivityId>),
}

impl Step<'_> {
    fn resolution(&self) -> Resolution {
        match self {
            Step::Terminal => Resolution::Terminal,
            Step::Single(_) => Resolution::Single,
            Step::Linked(_) => Resolution::Linked,
            Step::Unresolved(candidates) => Resolution::Unresolved {
                candidates: candidates.clone(),
            },
        }
    }
}

/// A followed conversion chain
struct Walk<'a> {
    resolution: Resolution,
    chain: Vec<&'a Activity>,
    visited: Vec<ItemId>,
    pending_link: Option<ItemId>,
}

impl Walk<'_> {
    fn final_item(&self) -> ItemId {
        // `visited` always starts with the source item
        self.visited[self.visited.len() - 1]
    }
}

/// Resolves owned items into banked experience
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    links: &'a LinkRegistry,
    config: &'a BankedConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, links: &'a LinkRegistry, config: &'a BankedConfig) -> Self {
        Self {
            catalog,
            links,
            config,
        }
    }

    /// Run a full resolution pass
    pub fn resolve(&self, owned: &OwnedItems) -> Result<BankedItemMap, ResolveError> {
        let mut walks: BTreeMap<ItemId, Walk<'a>> = BTreeMap::new();
        let mut pending: Vec<ItemId> = Vec::new();
        let mut untracked = 0usize;

        for (id, _) in owned.iter() {
            if self.catalog.contains_item(id) {
                pending.push(id);
            } else {
                untracked += 1;
            }
        }

        while let Some(id) = pending.pop() {
            if walks.contains_key(&id) {
                continue;
            }
            let walk = self.walk(id)?;
            pending.extend(walk.visited.iter().skip(1).copied());
            walks.insert(id, walk);
        }

        let mut result = BankedItemMap::new();
        for (id, walk) in walks {
            // Every walked id came from the catalog
            let Some(item) = self.catalog.item(id) else {
                continue;
            };
            result.insert(self.price(item, owned.get(id), walk)?);
        }
        // Per-skill sums never exceed the grand total, so this covers both
        result.total_experience()?;

        tracing::debug!(
            "Resolved {} items ({} unresolved, {} owned items not in catalog)",
            result.len(),
            result.unresolved().count(),
            untracked
        );

        Ok(result)
    }

    /// Activities that could consume `item`, after level filtering
    fn candidates(&self, item: ItemId) -> Vec<&'a Activity> {
        self.catalog
            .activities_consuming(item)
            .filter(|activity| {
                !self.config.limit_to_current_level
                    || activity.available_at(self.config.level_of(activity.skill))
            })
            .collect()
    }

    fn step(&self, item: ItemId) -> Step<'a> {
        let candidates = self.candidates(item);
        match candidates.as_slice() {
            [] => Step::Terminal,
            [only] => Step::Single(*only),
            _ => match self.links.choose(item, &candidates) {
                Some(chosen) => Step::Linked(chosen),
                None => Step::Unresolved(candidates.iter().map(|a| a.id.clone()).collect()),
            },
        }
    }

    /// Follow conversions from `source` until a terminal or undecided item
    fn walk(&self, source: ItemId) -> Result<Walk<'a>, ResolveError> {
        let first = self.step(source);
        let mut walk = Walk {
            resolution: first.resolution(),
            chain: Vec::new(),
            visited: vec![source],
            pending_link: None,
        };

        let mut step = first;
        loop {
            let activity = match step {
                Step::Terminal => break,
                Step::Unresolved(_) => {
                    let current = walk.final_item();
                    if current != source {
                        walk.pending_link = Some(current);
                    }
                    break;
                }
                Step::Single(activity) | Step::Linked(activity) => activity,
            };

            walk.chain.push(activity);
            if walk.chain.len() > self.config.max_chain_depth {
                return Err(ResolveError::ChainTooDeep {
                    item: source,
                    limit: self.config.max_chain_depth,
                });
            }

            let Some(next) = activity.primary_output() else {
                break;
            };
            if walk.visited.contains(&next) {
                let mut path = walk.visited.clone();
                path.push(next);
                return Err(ResolveError::CycleDetected { item: source, path });
            }
            walk.visited.push(next);
            step = self.step(next);
        }

        Ok(walk)
    }

    fn price(&self, item: &Item, quantity: Quantity, walk: Walk<'a>) -> Result<BankedItem, ResolveError> {
        let overflow = || ResolveError::Overflow(item.id);

        let mut per_skill: BTreeMap<Skill, Experience> = BTreeMap::new();
        match walk.resolution {
            Resolution::Terminal => {
                if let Some(skill) = item.skill {
                    if item.experience > 0 {
                        per_skill.insert(skill, item.experience);
                    }
                }
            }
            Resolution::Single | Resolution::Linked => {
                for activity in &walk.chain {
                    let entry = per_skill.entry(activity.skill).or_insert(0);
                    *entry = entry.checked_add(activity.experience).ok_or_else(overflow)?;
                }
            }
            Resolution::Unresolved { .. } => {}
        }

        let mut experience_per_unit: Experience = 0;
        let mut skills = Vec::with_capacity(per_skill.len());
        for (skill, per_unit) in per_skill {
            experience_per_unit = experience_per_unit.checked_add(per_unit).ok_or_else(overflow)?;
            skills.push(SkillExperience {
                skill,
                experience: per_unit.checked_mul(quantity).ok_or_else(overflow)?,
            });
        }
        let total_experience = experience_per_unit.checked_mul(quantity).ok_or_else(overflow)?;

        let final_item = walk.final_item();
        Ok(BankedItem {
            item: item.id,
            name: item.name.clone(),
            quantity,
            resolution: walk.resolution,
            chain: walk.chain.iter().map(|a| a.id.clone()).collect(),
            final_item,
            pending_link: walk.pending_link,
            experience_per_unit,
            total_experience,
            skills,
        })
    }
}

/// Convenience wrapper for a one-off pass
pub fn resolve(
    catalog: &Catalog,
    owned: &OwnedItems,
    links: &LinkRegistry,
    config: &BankedConfig,
) -> Result<BankedItemMap, ResolveError> {
    Resolver::new(catalog, links, config).resolve(owned)
}
