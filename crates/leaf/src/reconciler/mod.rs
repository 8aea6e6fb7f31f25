//! The reconciliation pipeline: build, diff, commit, then flush effects.
//!
//! [`RenderContext`] owns all state that survives between passes: the hook
//! registry, the previous fiber tree and the effect queue. One call to
//! [`RenderContext::render_pass`] builds, diffs and commits against a render
//! target; the effects it queued run through [`PendingEffects::flush`] once the
//! caller has released the target and the context.

mod builder;
mod commit;
mod diff;

use indextree::NodeId;
use leaf_dom::{NodeKey, RenderTarget};
use log::{debug, info};
use serde::Serialize;

use crate::config::LeafConfig;
use crate::effects::{self, EffectQueue};
use crate::element::Node;
use crate::error::RenderError;
use crate::fiber::{Classification, FiberTree, InstanceKey};
use crate::hooks::{HookRegistry, Scope};
use crate::scheduler::Scheduler;

/// Summary of one completed pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub pass: u64,
    pub placements: usize,
    pub updates: usize,
    pub unchanged: usize,
    pub deletions: usize,
    pub created_nodes: usize,
    pub inserted_nodes: usize,
    pub removed_nodes: usize,
    pub effects_run: usize,
    pub effect_failures: usize,
    /// Instance key and classification of every fiber of the new tree, in pre-order.
    pub fibers: Vec<(String, Classification)>,
}

impl PassReport {
    /// Classification of the fiber with exactly this instance key.
    pub fn classification(&self, key: &str) -> Option<Classification> {
        self.fibers
            .iter()
            .find(|(fiber, _)| fiber == key)
            .map(|(_, classification)| *classification)
    }

    /// Fibers whose instance key ends with `suffix`.
    pub fn matching<'report>(
        &'report self,
        suffix: &'report str,
    ) -> impl Iterator<Item = (&'report str, Classification)> + 'report {
        self.fibers
            .iter()
            .filter(move |(key, _)| key.ends_with(suffix))
            .map(|(key, classification)| (key.as_str(), *classification))
    }

    /// Whether the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.placements == 0 && self.updates == 0 && self.deletions == 0
    }
}

/// Effects queued by a committed pass, detached from the [`RenderContext`].
#[must_use = "queued effects only run when flushed"]
pub struct PendingEffects {
    queue: EffectQueue,
    pass_summary: bool,
}

impl PendingEffects {
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the effects in queue order and record the outcome in `report`.
    pub fn flush(self, report: &mut PassReport) {
        let flushed = effects::flush(&self.queue);
        report.effects_run += flushed.ran;
        report.effect_failures += flushed.failed;
        debug!(
            target: "leaf::commit",
            "pass {} committed: {} placed, {} updated, {} deleted, {} effects",
            report.pass,
            report.placements,
            report.updates,
            report.deletions,
            report.effects_run
        );
        if self.pass_summary {
            match serde_json::to_string(report) {
                Ok(summary) => info!(target: "leaf::commit", "{summary}"),
                Err(err) => debug!(target: "leaf::commit", "pass summary unavailable: {err}"),
            }
        }
    }
}

impl core::fmt::Debug for PendingEffects {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PendingEffects")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// State carried from one render pass to the next.
pub struct RenderContext {
    pub(crate) hooks: HookRegistry,
    pub(crate) scope: Scope,
    pub(crate) effects: EffectQueue,
    pub(crate) deletions: Vec<NodeId>,
    /// Instances whose hook store was created by the pass in progress.
    pub(crate) mounted: Vec<InstanceKey>,
    pub(crate) config: LeafConfig,
    previous: Option<FiberTree>,
    scheduler: Scheduler,
    passes: u64,
}

impl RenderContext {
    pub fn new(scheduler: Scheduler, config: LeafConfig) -> Self {
        let effects = EffectQueue::default();
        Self {
            hooks: HookRegistry::default(),
            scope: Scope::new(scheduler.clone(), effects.clone()),
            effects,
            deletions: Vec::new(),
            mounted: Vec::new(),
            config,
            previous: None,
            scheduler,
            passes: 0,
        }
    }

    pub const fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Fiber tree committed by the last successful pass.
    pub const fn current_tree(&self) -> Option<&FiberTree> {
        self.previous.as_ref()
    }

    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub const fn config(&self) -> &LeafConfig {
        &self.config
    }

    /// Number of passes attempted, failed ones included.
    pub const fn passes(&self) -> u64 {
        self.passes
    }

    /// Render `node` into `container` and bring the target up to date.
    ///
    /// Effects queued by the pass are not run here; take them with
    /// [`RenderContext::pending_effects`] and flush them once no borrow of the
    /// target or the context is held.
    ///
    /// On error the new tree, pending deletions and pending effects are
    /// discarded, effect dependencies overwritten by the build are restored and
    /// the previous tree stays current. Mutations already applied to the target
    /// are not rolled back.
    pub fn render_pass(
        &mut self,
        node: &Node,
        target: &mut dyn RenderTarget,
        container: NodeKey,
    ) -> Result<PassReport, RenderError> {
        self.passes += 1;
        debug!(target: "leaf::build", "pass {} starting", self.passes);
        let outcome = self.run_pass(node, target, container);
        if let Err(err) = &outcome {
            debug!(target: "leaf::commit", "pass {} aborted: {err}", self.passes);
            self.deletions.clear();
            self.effects.clear();
            self.effects.restore_deps();
            for instance in self.mounted.drain(..) {
                self.hooks.remove(&instance);
            }
        } else {
            self.mounted.clear();
            self.effects.keep_deps();
        }
        outcome
    }

    /// Effects queued by the last committed pass.
    pub fn pending_effects(&self) -> PendingEffects {
        PendingEffects {
            queue: self.effects.clone(),
            pass_summary: self.config.pass_summary,
        }
    }

    fn run_pass(
        &mut self,
        node: &Node,
        target: &mut dyn RenderTarget,
        container: NodeKey,
    ) -> Result<PassReport, RenderError> {
        let mut tree = builder::build_tree(self, node, container)?;
        let mut previous = self.previous.take();
        let committed = diff::diff(&mut tree, previous.as_mut(), &mut self.deletions)
            .and_then(|()| commit::commit(self, &mut tree, previous.as_ref(), target));
        let stats = match committed {
            Ok(stats) => stats,
            Err(err) => {
                self.previous = previous;
                return Err(err);
            }
        };

        let mut report = PassReport {
            pass: self.passes,
            deletions: stats.deleted,
            created_nodes: stats.created,
            inserted_nodes: stats.inserted,
            removed_nodes: stats.removed,
            effect_failures: stats.cleanup_failures,
            ..PassReport::default()
        };
        for id in tree.preorder() {
            let fiber = tree.node(id)?;
            match fiber.classification {
                Classification::Placement => report.placements += 1,
                Classification::Update => report.updates += 1,
                Classification::None => report.unchanged += 1,
                Classification::Deletion => {}
            }
            report.fibers.push((fiber.key.to_string(), fiber.classification));
        }

        self.previous = Some(tree);
        drop(previous);
        Ok(report)
    }
}

impl core::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderContext")
            .field("passes", &self.passes)
            .field("instances", &self.hooks.len())
            .field("fibers", &self.previous.as_ref().map_or(0, FiberTree::len))
            .field("pending_effects", &self.effects.len())
            .finish_non_exhaustive()
    }
}
