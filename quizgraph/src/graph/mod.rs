use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};

use crate::quiz::{Quiz, QuizId, QuizKind};

/// Content-addressed quiz graph.
///
/// An edge `parent → child` means a successful review of `parent` counts as
/// a passive review of `child`. All three maps keep insertion order and are
/// only ever added to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizGraph {
    pub nodes: IndexMap<QuizId, Quiz>,
    pub edges: IndexMap<QuizId, IndexSet<QuizId>>,
    /// Source text (a header line, or header and bullet joined by `\n`) →
    /// ids of the quizzes it produced.
    pub raws: IndexMap<String, IndexSet<QuizId>>,
}

impl QuizGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `quiz`, merging it into any node that already has its id.
    pub fn insert(&mut self, quiz: Quiz) {
        match self.nodes.entry(quiz.id().clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().absorb(quiz),
            Entry::Vacant(entry) => {
                entry.insert(quiz);
            }
        }
    }

    pub fn insert_raw(&mut self, raw: &str, id: QuizId) {
        self.raws.entry(raw.to_string()).or_default().insert(id);
    }

    pub fn insert_with_raw(&mut self, raw: &str, quiz: Quiz) {
        self.insert_raw(raw, quiz.id().clone());
        self.insert(quiz);
    }

    /// Insert both endpoints and the edge between them. Self-loops are
    /// dropped.
    pub fn add_edge(&mut self, parent: &Quiz, child: &Quiz) {
        self.insert(parent.clone());
        self.insert(child.clone());
        if parent.id() != child.id() {
            self.edges
                .entry(parent.id().clone())
                .or_default()
                .insert(child.id().clone());
        }
    }

    pub fn get(&self, id: &str) -> Option<&Quiz> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of edges (not parents).
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(IndexSet::len).sum()
    }

    pub fn children(&self, id: &str) -> impl Iterator<Item = &QuizId> {
        self.edges.get(id).into_iter().flatten()
    }

    pub fn parents<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a QuizId> + 'a {
        self.edges
            .iter()
            .filter(move |(_, children)| children.contains(id))
            .map(|(parent, _)| parent)
    }

    pub fn nodes_of_kind(&self, kind: QuizKind) -> impl Iterator<Item = &Quiz> {
        self.nodes.values().filter(move |q| q.kind() == kind)
    }

    pub fn count_kind(&self, kind: QuizKind) -> usize {
        self.nodes_of_kind(kind).count()
    }

    pub fn raw_ids(&self, raw: &str) -> Option<&IndexSet<QuizId>> {
        self.raws.get(raw)
    }

    /// Absorb another graph: nodes merge on id exactly as [`QuizGraph::insert`]
    /// does, edge and raw sets are unioned.
    pub fn merge_graph(&mut self, other: QuizGraph) {
        for (_, quiz) in other.nodes {
            self.insert(quiz);
        }
        for (parent, children) in other.edges {
            self.edges.entry(parent).or_default().extend(children);
        }
        for (raw, ids) in other.raws {
            self.raws.entry(raw).or_default().extend(ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::quiz::{Card, Translation};

    fn card(prompt: &str, response: &str) -> Card {
        Card::new(prompt, vec![response.to_string()], true, false)
    }

    fn en(text: &str) -> Option<Translation> {
        Some([("en".to_string(), text.to_string())].into_iter().collect())
    }

    #[test]
    fn insert_merges_on_id() {
        let mut graph = QuizGraph::new();
        let mut first = card("千尋", "ちひろ");
        first.annotations.translation = en("Chihiro");
        let mut second = card("千尋", "ちひろ");
        second.part_of_speech = Some(vec!["noun".into()]);

        graph.insert(first.into());
        graph.insert(second.into());

        assert_eq!(graph.len(), 1);
        let merged = graph.nodes[0].as_card().unwrap();
        assert_eq!(merged.annotations.translation, en("Chihiro"));
        assert_eq!(merged.part_of_speech, Some(vec!["noun".to_string()]));
    }

    #[test]
    fn raws_collect_ids_per_source() {
        let mut graph = QuizGraph::new();
        let a = Quiz::from(card("a", "1"));
        let b = Quiz::from(card("b", "2"));
        graph.insert_with_raw("# @ a", a.clone());
        graph.insert_with_raw("# @ a", b.clone());
        graph.insert_with_raw("# @ a", a.clone());

        let ids: Vec<&QuizId> = graph.raw_ids("# @ a").unwrap().iter().collect();
        assert_eq!(ids, vec![a.id(), b.id()]);
    }

    #[test]
    fn edges_are_sets_without_self_loops() {
        let mut graph = QuizGraph::new();
        let a = Quiz::from(card("a", "1"));
        let b = Quiz::from(card("b", "2"));
        graph.add_edge(&a, &b);
        graph.add_edge(&a, &b);
        graph.add_edge(&a, &a);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.children(a.id().as_str()).collect::<Vec<_>>(), vec![b.id()]);
        assert_eq!(graph.parents(b.id().as_str()).collect::<Vec<_>>(), vec![a.id()]);
        assert_eq!(graph.parents(a.id().as_str()).count(), 0);
    }

    #[test]
    fn merge_graph_matches_sequential_inserts() {
        let mut translated = card("父", "ちち");
        translated.annotations.translation = en("father");
        let plain = card("父", "ちち");
        let other = Quiz::from(card("母", "はは"));

        let mut left = QuizGraph::new();
        left.insert_with_raw("x", translated.clone().into());

        let mut right = QuizGraph::new();
        right.insert_with_raw("y", plain.clone().into());
        right.add_edge(&plain.clone().into(), &other);

        let mut sequential = QuizGraph::new();
        sequential.insert_with_raw("x", translated.into());
        sequential.insert_with_raw("y", plain.clone().into());
        sequential.add_edge(&plain.into(), &other);

        left.merge_graph(right);
        assert_eq!(left, sequential);
        assert_eq!(left.get(other.id().as_str()).map(Quiz::kind), Some(QuizKind::Card));
        assert_eq!(left.nodes[0].annotations().translation, en("father"));
    }
}
