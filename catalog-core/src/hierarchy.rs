use crate::ports::SnapshotObserver;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// A record that takes part in a parent/child forest.
pub trait Node: Clone + Send + Sync + 'static {
    /// The identifier other nodes refer to
    fn node_id(&self) -> u32;

    /// The identifier of the enclosing node, if any
    fn parent_id(&self) -> Option<u32>;
}

/// A subset of the collection that is computed on first use.
#[derive(Debug)]
pub enum DerivedView<T> {
    /// Not computed since the data was last replaced
    Empty,
    /// Computed and valid for the current data
    Built(Arc<[T]>),
}

impl<T> DerivedView<T> {
    fn built(&self) -> Option<Arc<[T]>> {
        match self {
            Self::Empty => None,
            Self::Built(view) => Some(view.clone()),
        }
    }
}

#[derive(Debug)]
struct State<T> {
    data: Arc<[T]>,
    top_level: DerivedView<T>,
    leaves: DerivedView<T>,
}

impl<T> State<T> {
    fn fresh(data: Arc<[T]>) -> Self {
        Self {
            data,
            top_level: DerivedView::Empty,
            leaves: DerivedView::Empty,
        }
    }
}

/// The top-level and leaf subsets of a node collection.
///
/// Both subsets are derived from the `parent_id` links and kept until the
/// data is replaced, at which point they are dropped and rebuilt by the next
/// reader. Only one reader ever builds a given view; the rest either find it
/// built or wait for the builder.
#[derive(Debug)]
pub struct CategoryIndex<T> {
    state: RwLock<State<T>>,
}

impl<T: Node> Default for CategoryIndex<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Node> CategoryIndex<T> {
    /// Index a collection
    pub fn new(data: Vec<T>) -> Self {
        Self {
            state: RwLock::new(State::fresh(data.into())),
        }
    }

    /// A copy of the whole collection
    pub fn all(&self) -> Vec<T> {
        self.state.read().data.to_vec()
    }

    /// The number of nodes
    pub fn len(&self) -> usize {
        self.state.read().data.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The nodes without a parent, in collection order
    pub fn top_level(&self) -> Vec<T> {
        self.view(ViewKind::TopLevel, |data| {
            data.iter()
                .filter(|node| node.parent_id().is_none())
                .cloned()
                .collect()
        })
        .to_vec()
    }

    /// A page of the nodes that are nobody's parent, in collection order.
    ///
    /// An `offset` at or past the end, or a `limit` of zero, gives an empty
    /// page; otherwise the page holds `min(limit, len - offset)` nodes.
    pub fn leaves(&self, offset: usize, limit: usize) -> Vec<T> {
        let leaves = self.view(ViewKind::Leaves, |data| {
            let parents: FxHashSet<u32> = data.iter().filter_map(Node::parent_id).collect();
            data.iter()
                .filter(|node| !parents.contains(&node.node_id()))
                .cloned()
                .collect()
        });
        if offset >= leaves.len() || limit == 0 {
            return Vec::new();
        }
        let end = offset.saturating_add(limit).min(leaves.len());
        leaves[offset..end].to_vec()
    }

    /// Replace the collection, discarding both derived views.
    pub fn reload_data(&self, data: Vec<T>) {
        self.replace(data.into());
    }

    /// Replace the collection with an already shared one.
    pub fn replace(&self, data: Arc<[T]>) {
        *self.state.write() = State::fresh(data);
    }

    fn view(&self, kind: ViewKind, derive: impl FnOnce(&[T]) -> Vec<T>) -> Arc<[T]> {
        if let Some(view) = kind.of(&*self.state.read()).built() {
            return view;
        }

        // Readers holding plain read guards keep going; only one thread at a
        // time gets past here, and it may find the work already done.
        let state = self.state.upgradable_read();
        if let Some(view) = kind.of(&*state).built() {
            return view;
        }
        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        let view: Arc<[T]> = derive(&state.data[..]).into();
        *kind.of_mut(&mut *state) = DerivedView::Built(view.clone());
        view
    }
}

#[derive(Clone, Copy)]
enum ViewKind {
    TopLevel,
    Leaves,
}

impl ViewKind {
    fn of<T>(self, state: &State<T>) -> &DerivedView<T> {
        match self {
            Self::TopLevel => &state.top_level,
            Self::Leaves => &state.leaves,
        }
    }

    fn of_mut<T>(self, state: &mut State<T>) -> &mut DerivedView<T> {
        match self {
            Self::TopLevel => &mut state.top_level,
            Self::Leaves => &mut state.leaves,
        }
    }
}

impl<T: Node> SnapshotObserver<T> for CategoryIndex<T> {
    fn replaced(&self, records: &Arc<[T]>) {
        self.replace(records.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use rstest::*;

    /// Two roots; leaves are 3, 4, 5, 6 and 7.
    #[fixture]
    fn index() -> CategoryIndex<Category> {
        CategoryIndex::new(vec![
            Category::new(1, "Home", None),
            Category::new(2, "Garden", None),
            Category::new(3, "Lamps", Some(1)),
            Category::new(4, "Rugs", Some(1)),
            Category::new(5, "Chairs", Some(1)),
            Category::new(6, "Tools", Some(2)),
            Category::new(7, "Seeds", Some(2)),
        ])
    }

    fn ids(nodes: &[Category]) -> Vec<u32> {
        nodes.iter().map(|node| node.id).collect()
    }

    #[rstest]
    fn test_top_level(index: CategoryIndex<Category>) {
        assert_eq!(ids(&index.top_level()), vec![1, 2]);
    }

    #[rstest]
    #[case::whole(0, 10, vec![3, 4, 5, 6, 7])]
    #[case::tail(3, 10, vec![6, 7])]
    #[case::middle(1, 2, vec![4, 5])]
    #[case::past_end(5, 1, vec![])]
    #[case::far_past_end(100, 1, vec![])]
    #[case::zero_limit(0, 0, vec![])]
    #[case::huge_limit(4, usize::MAX, vec![7])]
    fn test_leaf_pages(
        index: CategoryIndex<Category>,
        #[case] offset: usize,
        #[case] limit: usize,
        #[case] expected: Vec<u32>,
    ) {
        assert_eq!(ids(&index.leaves(offset, limit)), expected);
    }

    #[rstest]
    fn test_views_follow_reload(index: CategoryIndex<Category>) {
        // build both views against the old data first
        assert_eq!(index.top_level().len(), 2);
        assert_eq!(index.leaves(0, 10).len(), 5);

        index.reload_data(vec![
            Category::new(10, "Books", None),
            Category::new(11, "Novels", Some(10)),
        ]);
        assert_eq!(ids(&index.top_level()), vec![10]);
        assert_eq!(ids(&index.leaves(0, 10)), vec![11]);
        assert_eq!(index.len(), 2);
    }

    #[rstest]
    fn test_observer_replaces_data(index: CategoryIndex<Category>) {
        assert_eq!(index.leaves(0, 10).len(), 5);
        let records: Arc<[Category]> = vec![Category::new(9, "Solo", None)].into();
        index.replaced(&records);
        assert_eq!(ids(&index.top_level()), vec![9]);
        assert_eq!(ids(&index.leaves(0, 10)), vec![9]);
    }

    #[test]
    fn test_empty() {
        let index = CategoryIndex::<Category>::default();
        assert!(index.is_empty());
        assert!(index.top_level().is_empty());
        assert!(index.leaves(0, 10).is_empty());
    }

    #[rstest]
    fn test_concurrent_readers(index: CategoryIndex<Category>) {
        let index = Arc::new(index);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let index = index.clone();
                std::thread::spawn(move || ids(&index.leaves(0, 10)))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec![3, 4, 5, 6, 7]);
        }
    }
}
