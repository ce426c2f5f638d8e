use crate::error::{HerdbookError, Result};
use crate::lineage::resolver::{PedigreeNode, Relation};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

/// Pedigree flattened into a graph where each animal appears once.
///
/// Edges run from parent to offspring and carry the parent's role, so
/// ancestors are reached by walking incoming edges.
pub struct PedigreeGraph {
    graph: DiGraph<String, Relation>,
    node_map: HashMap<String, NodeIndex>,
    subject: NodeIndex,
}

impl PedigreeGraph {
    pub fn from_tree(root: &PedigreeNode) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let subject = graph.add_node(root.animal.id.clone());
        node_map.insert(root.animal.id.clone(), subject);

        let mut pedigree = Self {
            graph,
            node_map,
            subject,
        };
        pedigree.add_parents(root, subject);

        debug!(
            "Built pedigree graph with {} animals and {} parent links",
            pedigree.node_count(),
            pedigree.edge_count()
        );
        pedigree
    }

    fn add_parents(&mut self, node: &PedigreeNode, offspring: NodeIndex) {
        for parent in &node.children {
            let index = self.index_for(&parent.animal.id);
            if self.graph.find_edge(index, offspring).is_none() {
                self.graph.add_edge(index, offspring, parent.relation);
            }
            self.add_parents(parent, index);
        }
    }

    fn index_for(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(id) {
            return index;
        }
        let index = self.graph.add_node(id.to_string());
        self.node_map.insert(id.to_string(), index);
        index
    }

    /// Number of distinct animals
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct parent links
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn subject_id(&self) -> &str {
        &self.graph[self.subject]
    }

    /// Every ancestor of an animal, nearest generation first
    pub fn ancestors(&self, id: &str) -> Result<Vec<String>> {
        let start = *self
            .node_map
            .get(id)
            .ok_or_else(|| HerdbookError::NotFound(format!("animal '{}' in pedigree", id)))?;

        let mut visited = HashSet::new();
        let mut ancestors = Vec::new();
        let mut queue = VecDeque::new();

        queue.push_back(start);
        visited.insert(start);

        while let Some(current) = queue.pop_front() {
            for parent in self.graph.neighbors_directed(current, Direction::Incoming) {
                if visited.insert(parent) {
                    queue.push_back(parent);
                    ancestors.push(self.graph[parent].clone());
                }
            }
        }

        Ok(ancestors)
    }

    /// Direct parent of an animal in the given role
    pub fn parent(&self, id: &str, relation: Relation) -> Option<&str> {
        let index = *self.node_map.get(id)?;
        self.graph
            .edges_directed(index, Direction::Incoming)
            .find(|edge| *edge.weight() == relation)
            .map(|edge| self.graph[edge.source()].as_str())
    }

    /// Animals in the pedigree with no known parents, sorted by id
    pub fn founders(&self) -> Vec<String> {
        let mut founders: Vec<String> = self
            .node_map
            .iter()
            .filter(|(_, index)| {
                self.graph
                    .neighbors_directed(**index, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|(id, _)| id.clone())
            .collect();
        founders.sort();
        founders
    }

    /// Animals that appear on both the dam and sire side of the subject.
    /// A non-empty result means the subject is inbred within the resolved depth.
    pub fn shared_ancestors(&self) -> Vec<String> {
        let subject = self.subject_id();
        let side = |relation: Relation| -> BTreeSet<String> {
            let Some(parent) = self.parent(subject, relation) else {
                return BTreeSet::new();
            };
            let mut line: BTreeSet<String> = self.ancestors(parent).unwrap_or_default().into_iter().collect();
            line.insert(parent.to_string());
            line
        };

        let dam_side = side(Relation::Dam);
        let sire_side = side(Relation::Sire);
        dam_side.intersection(&sire_side).cloned().collect()
    }

    /// Length of the longest ancestor chain above the subject
    pub fn generations(&self) -> usize {
        self.longest_chain(self.subject, &mut HashSet::new())
    }

    fn longest_chain(&self, index: NodeIndex, on_path: &mut HashSet<NodeIndex>) -> usize {
        if !on_path.insert(index) {
            return 0;
        }

        let parents: Vec<NodeIndex> = self.graph.neighbors_directed(index, Direction::Incoming).collect();
        let mut longest = 0;
        for parent in parents {
            if on_path.contains(&parent) {
                continue;
            }
            longest = longest.max(self.longest_chain(parent, on_path) + 1);
        }

        on_path.remove(&index);
        longest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Animal;

    fn node(id: &str, relation: Relation, children: Vec<PedigreeNode>) -> PedigreeNode {
        PedigreeNode {
            animal: Animal::new(id),
            relation,
            children,
        }
    }

    fn leaf(id: &str, relation: Relation) -> PedigreeNode {
        node(id, relation, Vec::new())
    }

    /// calf <- dam <- (granddam, patriarch); calf <- sire <- patriarch
    fn inbred_tree() -> PedigreeNode {
        node(
            "calf",
            Relation::Subject,
            vec![
                node(
                    "dam",
                    Relation::Dam,
                    vec![leaf("granddam", Relation::Dam), leaf("patriarch", Relation::Sire)],
                ),
                node("sire", Relation::Sire, vec![leaf("patriarch", Relation::Sire)]),
            ],
        )
    }

    #[test]
    fn test_repeated_ancestor_is_deduplicated() {
        let graph = PedigreeGraph::from_tree(&inbred_tree());

        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 5);
        assert_eq!(graph.subject_id(), "calf");
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let graph = PedigreeGraph::from_tree(&inbred_tree());
        let ancestors = graph.ancestors("calf").unwrap();

        assert_eq!(ancestors.len(), 4);
        let parents: HashSet<&str> = ancestors[..2].iter().map(String::as_str).collect();
        assert_eq!(parents, HashSet::from(["dam", "sire"]));
        assert!(ancestors.contains(&"patriarch".to_string()));

        assert!(graph.ancestors("granddam").unwrap().is_empty());
        assert!(matches!(graph.ancestors("stranger"), Err(HerdbookError::NotFound(_))));
    }

    #[test]
    fn test_parent_by_relation() {
        let graph = PedigreeGraph::from_tree(&inbred_tree());

        assert_eq!(graph.parent("calf", Relation::Dam), Some("dam"));
        assert_eq!(graph.parent("calf", Relation::Sire), Some("sire"));
        assert_eq!(graph.parent("sire", Relation::Dam), None);
    }

    #[test]
    fn test_founders() {
        let graph = PedigreeGraph::from_tree(&inbred_tree());
        assert_eq!(graph.founders(), vec!["granddam".to_string(), "patriarch".to_string()]);
    }

    #[test]
    fn test_shared_ancestors() {
        let graph = PedigreeGraph::from_tree(&inbred_tree());
        assert_eq!(graph.shared_ancestors(), vec!["patriarch".to_string()]);

        let outbred = node(
            "calf",
            Relation::Subject,
            vec![leaf("dam", Relation::Dam), leaf("sire", Relation::Sire)],
        );
        assert!(PedigreeGraph::from_tree(&outbred).shared_ancestors().is_empty());
    }

    #[test]
    fn test_generations() {
        assert_eq!(PedigreeGraph::from_tree(&inbred_tree()).generations(), 2);
        assert_eq!(PedigreeGraph::from_tree(&leaf("solo", Relation::Subject)).generations(), 0);
    }

    #[test]
    fn test_generations_with_crossed_parents() {
        // dam and sire each list the other as a parent on different branches
        let crossed = node(
            "calf",
            Relation::Subject,
            vec![
                node("dam", Relation::Dam, vec![leaf("sire", Relation::Dam)]),
                node("sire", Relation::Sire, vec![leaf("dam", Relation::Dam)]),
            ],
        );
        let graph = PedigreeGraph::from_tree(&crossed);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.generations(), 2);
    }
}
