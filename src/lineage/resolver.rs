use crate::config::LineageSettings;
use crate::error::{HerdbookError, Result};
use crate::store::AnimalLookup;
use crate::types::Animal;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// How a node relates to the node it hangs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The animal the lineage was requested for
    Subject,
    Dam,
    Sire,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Subject => write!(f, "Subject"),
            Relation::Dam => write!(f, "Dam"),
            Relation::Sire => write!(f, "Sire"),
        }
    }
}

/// One animal in a resolved pedigree. Children are its parents: the dam
/// branch first, then the sire branch, each present only if it resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PedigreeNode {
    pub animal: Animal,
    pub relation: Relation,
    pub children: Vec<PedigreeNode>,
}

impl PedigreeNode {
    pub fn leaf(animal: Animal, relation: Relation) -> Self {
        Self {
            animal,
            relation,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn mother(&self) -> Option<&PedigreeNode> {
        self.children.iter().find(|c| c.relation == Relation::Dam)
    }

    pub fn father(&self) -> Option<&PedigreeNode> {
        self.children.iter().find(|c| c.relation == Relation::Sire)
    }

    /// Number of edges on the longest path down to a leaf
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

/// Why a parent link did not become a branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GapReason {
    /// The parent is already on the path from the subject to this node
    Cycle,
    NotFound,
    TimedOut,
    LookupFailed { message: String },
}

impl fmt::Display for GapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapReason::Cycle => write!(f, "cycle"),
            GapReason::NotFound => write!(f, "not found"),
            GapReason::TimedOut => write!(f, "timed out"),
            GapReason::LookupFailed { message } => write!(f, "lookup failed: {}", message),
        }
    }
}

/// A parent link that was set but could not be followed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageGap {
    pub child_id: String,
    pub parent_id: String,
    pub relation: Relation,
    #[serde(flatten)]
    pub reason: GapReason,
}

/// Result of a lineage query: the tree plus every branch that was dropped
#[derive(Debug, Clone, Serialize)]
pub struct Lineage {
    pub query_id: Uuid,
    pub requested_depth: u32,
    pub effective_depth: u32,
    pub root: PedigreeNode,
    pub gaps: Vec<LineageGap>,
}

impl Lineage {
    pub fn has_gaps(&self) -> bool {
        !self.gaps.is_empty()
    }

    pub fn cycle_detected(&self) -> bool {
        self.gaps.iter().any(|g| g.reason == GapReason::Cycle)
    }
}

enum Lookup {
    Found(Animal),
    Missing,
    TimedOut,
    Failed(HerdbookError),
}

#[derive(Default)]
struct Branch {
    node: Option<PedigreeNode>,
    gaps: Vec<LineageGap>,
}

impl Branch {
    fn gap(child: &Animal, parent_id: &str, relation: Relation, reason: GapReason) -> Self {
        Self {
            node: None,
            gaps: vec![LineageGap {
                child_id: child.id.clone(),
                parent_id: parent_id.to_string(),
                relation,
                reason,
            }],
        }
    }
}

/// Resolves ancestry trees through an injected animal lookup
pub struct PedigreeResolver {
    store: Arc<dyn AnimalLookup>,
    settings: LineageSettings,
}

impl PedigreeResolver {
    pub fn new(store: Arc<dyn AnimalLookup>, settings: LineageSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &LineageSettings {
        &self.settings
    }

    /// Resolve with the configured default depth
    pub async fn resolve_default(&self, root_id: &str) -> Result<Lineage> {
        self.resolve_lineage(root_id, self.settings.default_depth).await
    }

    /// Resolve the ancestry of `root_id` down to `max_depth` generations.
    ///
    /// Only the root lookup can fail the call. Missing, dangling, cyclic or
    /// slow parent links drop their branch and are reported in
    /// [`Lineage::gaps`].
    #[instrument(skip(self), fields(query_id = tracing::field::Empty))]
    pub async fn resolve_lineage(&self, root_id: &str, max_depth: u32) -> Result<Lineage> {
        let query_id = Uuid::new_v4();
        tracing::Span::current().record("query_id", tracing::field::display(query_id));

        let effective_depth = self.effective_depth(max_depth);

        let root = match self.fetch(root_id).await {
            Lookup::Found(animal) => animal,
            Lookup::Missing => {
                return Err(HerdbookError::NotFound(format!("animal '{}'", root_id)));
            }
            Lookup::TimedOut => {
                return Err(HerdbookError::LookupTimeout {
                    id: root_id.to_string(),
                    timeout_ms: self.settings.lookup_timeout_ms,
                });
            }
            Lookup::Failed(e) => return Err(e),
        };

        let mut path = HashSet::new();
        path.insert(root_id.to_string());
        path.insert(root.id.clone());

        let branch = self.expand(root, Relation::Subject, effective_depth, path).await;
        let root = branch
            .node
            .ok_or_else(|| HerdbookError::Store(format!("lineage of '{}' produced no root", root_id)))?;

        info!(
            "Resolved lineage of {} with {} animals over {} generations ({} gaps)",
            root_id,
            root.node_count(),
            root.height(),
            branch.gaps.len()
        );

        Ok(Lineage {
            query_id,
            requested_depth: max_depth,
            effective_depth,
            root,
            gaps: branch.gaps,
        })
    }

    fn effective_depth(&self, requested: u32) -> u32 {
        if requested > self.settings.depth_ceiling {
            warn!(
                "Requested lineage depth {} exceeds ceiling, clamping to {}",
                requested, self.settings.depth_ceiling
            );
            self.settings.depth_ceiling
        } else {
            requested
        }
    }

    async fn fetch(&self, id: &str) -> Lookup {
        match timeout(self.settings.lookup_timeout(), self.store.lookup_animal(id)).await {
            Ok(Ok(Some(animal))) => Lookup::Found(animal),
            Ok(Ok(None)) => Lookup::Missing,
            Ok(Err(e)) => Lookup::Failed(e),
            Err(_) => Lookup::TimedOut,
        }
    }

    /// Build the node for `animal` and, while depth remains, both parent
    /// branches. `path` holds every id from the subject down to `animal`.
    fn expand(
        &self,
        animal: Animal,
        relation: Relation,
        remaining: u32,
        path: HashSet<String>,
    ) -> BoxFuture<'_, Branch> {
        async move {
            if remaining == 0 {
                return Branch {
                    node: Some(PedigreeNode::leaf(animal, relation)),
                    gaps: Vec::new(),
                };
            }

            let dam = self.resolve_parent(&animal, Relation::Dam, remaining - 1, &path);
            let sire = self.resolve_parent(&animal, Relation::Sire, remaining - 1, &path);
            let (dam, sire) = if self.settings.parallel_lookups {
                tokio::join!(dam, sire)
            } else {
                (dam.await, sire.await)
            };

            let mut node = PedigreeNode::leaf(animal, relation);
            let mut gaps = Vec::new();
            for branch in [dam, sire] {
                node.children.extend(branch.node);
                gaps.extend(branch.gaps);
            }

            Branch {
                node: Some(node),
                gaps,
            }
        }
        .boxed()
    }

    async fn resolve_parent(
        &self,
        child: &Animal,
        relation: Relation,
        remaining: u32,
        path: &HashSet<String>,
    ) -> Branch {
        let parent_id = match relation {
            Relation::Dam => child.mother_id.as_deref(),
            Relation::Sire => child.father_id.as_deref(),
            Relation::Subject => None,
        };
        let Some(parent_id) = parent_id else {
            return Branch::default();
        };

        if path.contains(parent_id) {
            warn!(
                "Cycle in pedigree: {} lists ancestor {} as its {:?}",
                child.id, parent_id, relation
            );
            return Branch::gap(child, parent_id, relation, GapReason::Cycle);
        }

        match self.fetch(parent_id).await {
            Lookup::Found(parent) => {
                let mut branch_path = path.clone();
                branch_path.insert(parent_id.to_string());
                branch_path.insert(parent.id.clone());
                self.expand(parent, relation, remaining, branch_path).await
            }
            Lookup::Missing => {
                debug!("{:?} {} of {} not found, skipping branch", relation, parent_id, child.id);
                Branch::gap(child, parent_id, relation, GapReason::NotFound)
            }
            Lookup::TimedOut => {
                warn!("Lookup of {:?} {} of {} timed out", relation, parent_id, child.id);
                Branch::gap(child, parent_id, relation, GapReason::TimedOut)
            }
            Lookup::Failed(e) => {
                warn!("Lookup of {:?} {} of {} failed: {}", relation, parent_id, child.id, e);
                Branch::gap(
                    child,
                    parent_id,
                    relation,
                    GapReason::LookupFailed {
                        message: e.to_string(),
                    },
                )
            }
        }
    }
}
