use std::{collections::BTreeSet, hash::Hash};

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Records which element was replaced by which other element. Replacements can be chained,
/// if `a` is replaced by `b` and later `b` is replaced by `c`, then [`Redirections::resolve`]
/// maps `a` to `c`. Elements that were never replaced resolve to themselves.
///
/// Resolution compresses the chains it walks, so repeatedly resolving stale elements
/// stays cheap even for long cascades of replacements.
#[derive(Debug, Clone)]
pub struct Redirections<I> {
    parent: Map<I, I>,
}

impl<I> Default for Redirections<I> {
    fn default() -> Self {
        Self {
            parent: Map::default(),
        }
    }
}

impl<I: Copy + Eq + Hash> Redirections<I> {
    /// Records that `from` has been replaced by `to`. Redirecting an element to itself is ignored.
    pub fn redirect(&mut self, from: I, to: I) {
        if from != to {
            self.parent.insert(from, to);
        }
    }

    /// Redirects every element of `from` to `to`.
    pub fn redirect_all<'a, It>(&mut self, from: It, to: I)
    where
        I: 'a,
        It: IntoIterator<Item = &'a I>,
    {
        for &x in from {
            self.redirect(x, to);
        }
    }

    /// Follows the chain of replacements starting in `x` and returns the element at its end.
    pub fn resolve(&mut self, x: I) -> I {
        let mut root = x;
        while let Some(&next) = self.parent.get(&root) {
            root = next;
        }

        let mut current = x;
        while let Some(next) = self.parent.get_mut(&current) {
            let old = *next;
            *next = root;
            current = old;
            if current == root {
                break;
            }
        }
        root
    }

    /// Resolves every element of `iter` and collects the distinct results.
    pub fn resolve_all<It: IntoIterator<Item = I>>(&mut self, iter: It) -> BTreeSet<I>
    where
        I: Ord,
    {
        iter.into_iter().map(|x| self.resolve(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Redirections;

    #[test]
    fn chained_redirections_resolve_to_last_replacement() {
        let mut redirections = Redirections::default();
        redirections.redirect(0usize, 3);
        redirections.redirect(3, 5);
        redirections.redirect(1, 5);
        redirections.redirect(5, 7);

        assert_eq!(redirections.resolve(0), 7);
        assert_eq!(redirections.resolve(1), 7);
        assert_eq!(redirections.resolve(2), 2);
        assert_eq!(redirections.resolve(7), 7);
        assert_eq!(redirections.resolve(3), 7);

        // compressed chains still answer the same way
        assert_eq!(redirections.resolve(0), 7);
        assert_eq!(
            redirections.resolve_all([0, 1, 2, 3]).into_iter().collect::<Vec<_>>(),
            vec![2, 7]
        );
    }

    #[test]
    fn self_redirection_is_ignored() {
        let mut redirections = Redirections::default();
        redirections.redirect(4usize, 4);
        assert_eq!(redirections.resolve(4), 4);
        redirections.redirect(4, 6);
        redirections.redirect(6, 6);
        assert_eq!(redirections.resolve(4), 6);
    }
}
