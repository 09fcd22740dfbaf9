//! First-pass traversal of a subtree with no tracked prior version.

use fibertrace_protocols::NodeRef;

use super::CommitPass;
use crate::extractor::{ParentLink, displayed_children};

impl CommitPass<'_> {
    /// Walk `start` depth-first, parents before children, siblings left to
    /// right, assigning identities to every visited node.
    ///
    /// Relevant nodes that performed work are mounted, or updated when they
    /// are already recorded. A relevant node the index has never seen is
    /// recorded even without work flags, so attaching to an already
    /// rendered root still covers the whole visible tree.
    pub fn mount_walk(&mut self, start: NodeRef, parent: Option<ParentLink>) {
        let mut stack = vec![(start, parent)];
        while let Some((node, parent)) = stack.pop() {
            let alternate = self.tree.alternate(node);
            let (id, _) = self.identities.get_or_assign(node, alternate);

            if self.tree.tag(node).kind().is_relevant() {
                if !self.index.contains(id) {
                    self.mount(node, id, parent);
                } else if self.tree.flags(node).did_perform_work() {
                    self.update(node, id, parent);
                }
            }

            let link = self.link_for(id, parent);
            for child in displayed_children(self.tree, node).into_iter().rev() {
                stack.push((child, link));
            }
        }
    }
}
