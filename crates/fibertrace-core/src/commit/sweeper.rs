//! Removal of discarded subtrees.

use std::collections::HashSet;

use fibertrace_protocols::NodeRef;
use fibertrace_protocols::tree::children;

use super::CommitPass;

impl CommitPass<'_> {
    /// Unmount every tracked node under `start`, children before parents.
    ///
    /// Only nodes that carry an identity are descended into, which limits
    /// the sweep to what the walker and differ actually visited: the
    /// displayed branch of each Suspense boundary plus any primary branch
    /// retained while its fallback was showing. Sweeping an already swept
    /// node is a no-op.
    pub fn sweep(&mut self, start: NodeRef) {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            let Some(id) = self.identities.lookup(node) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            stack.extend(children(self.tree, node));
        }

        for id in order.into_iter().rev() {
            self.unmount(id);
        }
    }
}
