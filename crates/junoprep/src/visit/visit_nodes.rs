use super::VisitMut;
use crate::hierarchy::tree::{Node, Tree};
use crate::path::Path;

/// Recursively visit all [Node]s mutably, in pre-order
///
/// The visitor sees a node before its children, so children removed or added by the visitor
/// are (not) visited accordingly.
pub trait VisitNodesMut {
    fn visit_nodes_mut(&mut self, visitor: &mut dyn VisitMut<Node>);
}

impl VisitNodesMut for Tree {
    fn visit_nodes_mut(&mut self, visitor: &mut dyn VisitMut<Node>) {
        let mut path = Path::default();
        visit(self.root_mut(), &mut path, visitor);
    }
}

fn visit(node: &mut Node, path: &mut Path, visitor: &mut dyn VisitMut<Node>) {
    visitor.visit_mut(path, node);

    for child in node.children.values_mut() {
        let Some(segment) = child.segment().cloned() else {
            continue;
        };
        path.push(segment);
        visit(child, path, visitor);
        path.pop();
    }
}
