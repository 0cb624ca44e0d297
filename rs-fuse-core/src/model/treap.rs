use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Index of a node in the arena.
type NodeIndex = usize;

/// A node of the [`Treap`].
///
/// Children are indices into the treap's node arena.
#[derive(Debug, Clone)]
struct TreapNode {
	/// Stored value.
	element: f64,
	/// Balancing priority (heap-ordered).
	weight: u32,
	left: Option<NodeIndex>,
	right: Option<NodeIndex>,
	/// Sum of elements in the subtree, this node included.
	subtree_sum: f64,
	/// Number of nodes in the subtree, this node included.
	subtree_cnt: usize,
}

/// Randomized balanced binary search tree over real values (Cartesian tree).
///
/// Supports insertion and the query "how many elements, and what sum of
/// elements, are lower than a value" in expected `O(log n)`.
///
/// # Invariants
/// - In-order traversal is sorted by element
/// - A node's priority is `>=` the priorities of its children
/// - `subtree_sum` / `subtree_cnt` always match the real subtree
/// - Nodes are never removed: the arena only grows
///
/// Priorities come from an explicit generator `R`, so the tree shape is
/// reproducible for a given seed. Query results do not depend on it.
#[derive(Debug, Clone)]
pub struct Treap<R = StdRng> {
	nodes: Vec<TreapNode>,
	root: Option<NodeIndex>,
	rng: R,
}

impl Treap<StdRng> {
	/// Creates an empty treap with priorities drawn from a seeded `StdRng`.
	pub fn with_seed(seed: u64) -> Self {
		Self::with_rng(StdRng::seed_from_u64(seed))
	}
}

impl<R: Rng> Treap<R> {
	/// Creates an empty treap drawing priorities from `rng`.
	pub fn with_rng(rng: R) -> Self {
		Self { nodes: Vec::new(), root: None, rng }
	}

	/// Number of stored elements.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Sum of all stored elements.
	pub fn sum(&self) -> f64 {
		self.root.map_or(0.0, |root| self.nodes[root].subtree_sum)
	}

	/// Inserts `element` in expected `O(log n)`.
	///
	/// The tree is split into elements `<= element` and `> element`, then the
	/// lower part, the new node and the upper part are joined back in
	/// priority order. A new element therefore sits after every equal element
	/// already stored; `get_lower` counts none of them either way.
	pub fn insert(&mut self, element: f64) {
		let weight = self.rng.random();
		self.nodes.push(TreapNode {
			element,
			weight,
			left: None,
			right: None,
			subtree_sum: element,
			subtree_cnt: 1,
		});
		let new_node = self.nodes.len() - 1;

		let (lower, upper) = self.split(self.root, element);
		let lower = self.join(lower, Some(new_node));
		self.root = self.join(lower, upper);
	}

	/// Count and sum of the elements strictly lower than `value`.
	///
	/// Returns `(0, 0.0)` on an empty tree.
	pub fn get_lower(&self, value: f64) -> (usize, f64) {
		let mut count = 0;
		let mut sum = 0.0;
		let mut current = self.root;
		while let Some(node) = current {
			let n = &self.nodes[node];
			if n.element < value {
				if let Some(left) = n.left {
					count += self.nodes[left].subtree_cnt;
					sum += self.nodes[left].subtree_sum;
				}
				count += 1;
				sum += n.element;
				current = n.right;
			} else {
				current = n.left;
			}
		}
		(count, sum)
	}

	/// Elements in ascending order.
	pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
		let mut stack = Vec::new();
		let mut current = self.root;
		std::iter::from_fn(move || {
			while let Some(node) = current {
				stack.push(node);
				current = self.nodes[node].left;
			}
			let node = stack.pop()?;
			current = self.nodes[node].right;
			Some(self.nodes[node].element)
		})
	}

	/// Recomputes the aggregates of `node`, assuming its children are valid.
	fn update(&mut self, node: NodeIndex) {
		let (left, right) = (self.nodes[node].left, self.nodes[node].right);
		let mut sum = self.nodes[node].element;
		let mut cnt = 1;
		for child in [left, right].into_iter().flatten() {
			sum += self.nodes[child].subtree_sum;
			cnt += self.nodes[child].subtree_cnt;
		}
		self.nodes[node].subtree_sum = sum;
		self.nodes[node].subtree_cnt = cnt;
	}

	/// Splits the subtree at `node` into elements `<= element` and `> element`.
	fn split(&mut self, node: Option<NodeIndex>, element: f64) -> (Option<NodeIndex>, Option<NodeIndex>) {
		let Some(node) = node else {
			return (None, None);
		};
		if element < self.nodes[node].element {
			let (l, r) = self.split(self.nodes[node].left, element);
			self.nodes[node].left = r;
			self.update(node);
			(l, Some(node))
		} else {
			let (l, r) = self.split(self.nodes[node].right, element);
			self.nodes[node].right = l;
			self.update(node);
			(Some(node), r)
		}
	}

	/// Joins two trees where every element of `left` precedes those of `right`.
	fn join(&mut self, left: Option<NodeIndex>, right: Option<NodeIndex>) -> Option<NodeIndex> {
		match (left, right) {
			(None, other) | (other, None) => other,
			(Some(l), Some(r)) => {
				if self.nodes[l].weight > self.nodes[r].weight {
					let joined = self.join(self.nodes[l].right, Some(r));
					self.nodes[l].right = joined;
					self.update(l);
					Some(l)
				} else {
					let joined = self.join(Some(l), self.nodes[r].left);
					self.nodes[r].left = joined;
					self.update(r);
					Some(r)
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Checks order, heap and aggregate invariants; returns (count, sum, height).
	fn check(treap: &Treap, node: Option<NodeIndex>, lo: f64, hi: f64) -> (usize, f64, usize) {
		let Some(index) = node else {
			return (0, 0.0, 0);
		};
		let n = &treap.nodes[index];
		assert!(lo <= n.element && n.element <= hi, "BST order violated");
		for child in [n.left, n.right].into_iter().flatten() {
			assert!(treap.nodes[child].weight <= n.weight, "heap order violated");
		}
		let (lc, ls, lh) = check(treap, n.left, lo, n.element);
		let (rc, rs, rh) = check(treap, n.right, n.element, hi);
		assert_eq!(n.subtree_cnt, lc + rc + 1);
		assert!((n.subtree_sum - (ls + rs + n.element)).abs() < 1e-9);
		(n.subtree_cnt, n.subtree_sum, 1 + lh.max(rh))
	}

	#[test]
	fn empty_tree_queries() {
		let treap = Treap::with_seed(1);
		assert!(treap.is_empty());
		assert_eq!(treap.get_lower(10.0), (0, 0.0));
		assert_eq!(treap.sum(), 0.0);
		assert_eq!(treap.iter().count(), 0);
	}

	#[test]
	fn get_lower_is_strict() {
		let mut treap = Treap::with_seed(3);
		for value in [0.5, 0.0, 1.0, 0.5, 0.25] {
			treap.insert(value);
		}
		assert_eq!(treap.get_lower(0.5), (2, 0.25));
		assert_eq!(treap.get_lower(0.51), (4, 1.25));
		assert_eq!(treap.get_lower(f64::INFINITY), (5, 2.25));
		assert_eq!(treap.get_lower(f64::NEG_INFINITY), (0, 0.0));
	}

	#[test]
	fn invariants_hold_after_many_inserts() {
		let mut treap = Treap::with_seed(42);
		let mut rng = StdRng::seed_from_u64(7);
		let mut values = Vec::new();
		for _ in 0..2000 {
			let value: f64 = rng.random_range(-5.0..5.0);
			values.push(value);
			treap.insert(value);
		}
		let (count, sum, height) = check(&treap, treap.root, f64::NEG_INFINITY, f64::INFINITY);
		assert_eq!(count, 2000);
		assert!((sum - values.iter().sum::<f64>()).abs() < 1e-6);
		// expected height is about 2 ln n
		assert!(height < 60, "height {} too large", height);

		values.sort_by(f64::total_cmp);
		assert_eq!(treap.iter().collect::<Vec<_>>(), values);
	}

	#[test]
	fn sorted_inserts_stay_shallow() {
		let mut treap = Treap::with_seed(11);
		for i in 0..5000 {
			treap.insert(i as f64);
		}
		let (_, _, height) = check(&treap, treap.root, f64::NEG_INFINITY, f64::INFINITY);
		assert!(height < 80, "height {} too large", height);
		assert_eq!(treap.get_lower(100.0), (100, (0..100).sum::<i32>() as f64));
	}

	#[test]
	fn same_seed_same_shape() {
		let mut a = Treap::with_seed(5);
		let mut b = Treap::with_seed(5);
		for value in [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0] {
			a.insert(value);
			b.insert(value);
		}
		assert_eq!(a.root, b.root);
		let shape = |t: &Treap| t.nodes.iter().map(|n| (n.left, n.right)).collect::<Vec<_>>();
		assert_eq!(shape(&a), shape(&b));
	}

	#[test]
	fn equal_elements_keep_insertion_order() {
		let mut treap = Treap::with_seed(13);
		for value in [1.0, 0.5, 2.0, 0.5, 0.5] {
			treap.insert(value);
		}
		fn in_order(treap: &Treap, node: Option<NodeIndex>, out: &mut Vec<NodeIndex>) {
			if let Some(index) = node {
				in_order(treap, treap.nodes[index].left, out);
				out.push(index);
				in_order(treap, treap.nodes[index].right, out);
			}
		}
		let mut order = Vec::new();
		in_order(&treap, treap.root, &mut order);
		// arena indices of the three copies of 0.5, in insertion order
		assert_eq!(order, vec![1, 3, 4, 0, 2]);
		assert_eq!(treap.get_lower(0.5), (0, 0.0));
		assert_eq!(treap.get_lower(1.0), (3, 1.5));

		let (l, r) = treap.split(treap.root, 0.5);
		assert_eq!(l.map(|n| treap.nodes[n].subtree_cnt), Some(3));
		assert_eq!(r.map(|n| treap.nodes[n].subtree_sum), Some(3.0));
	}

	#[test]
	fn split_then_join_restores_tree() {
		let mut treap = Treap::with_seed(9);
		for value in [2.0, 8.0, 4.0, 6.0, 0.0] {
			treap.insert(value);
		}
		let (l, r) = treap.split(treap.root, 4.0);
		assert_eq!(l.map(|n| treap.nodes[n].subtree_cnt), Some(3));
		assert_eq!(r.map(|n| treap.nodes[n].subtree_sum), Some(14.0));
		let root = treap.join(l, r);
		treap.root = root;
		check(&treap, treap.root, f64::NEG_INFINITY, f64::INFINITY);
		assert_eq!(treap.iter().collect::<Vec<_>>(), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
	}
}
