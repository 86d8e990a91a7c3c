//! Keyed reconciliation of incoming records against persistent visual elements.
//!
//! A refresh is reconciled in two phases:
//!
//! 1. **Planning**: every identity is derived exactly once and checked for
//!    uniqueness. Nothing is mutated, so a failing key rule leaves the previous
//!    state intact.
//! 2. **Applying**: the plan is matched against the keyed map, which yields the
//!    enter, update and exit sets and replaces the map in place.

use crate::animation::Motion;
use crate::error::FigureError;
use crate::scene::{Interaction, NodeId};
use crate::spec::{Element, Identity};
use std::collections::{BTreeSet, HashMap};

/// Persistent on-screen object bound to one identity.
#[derive(Debug, Clone)]
pub struct VisualElement {
    pub identity: Identity,
    pub node: NodeId,
    /// Record the element is currently bound to
    pub datum: Element,
    /// Classes currently applied on the surface
    pub classes: BTreeSet<String>,
    /// Interaction currently attached on the surface
    pub interaction: Interaction,
    /// Per-element animation state
    pub motion: Motion,
}

/// Reference to an element joined in the current refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub identity: Identity,
    pub node: NodeId,
    /// Position in the incoming sequence
    pub index: usize,
}

/// Outcome of one reconcile.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Newly created elements, in incoming order
    pub entering: Vec<Joined>,
    /// Surviving elements rebound to new records, in incoming order
    pub updating: Vec<Joined>,
    /// Elements whose identity vanished, in previous order
    pub exiting: Vec<VisualElement>,
    /// Whether survivors changed their relative order
    pub reordered: bool,
}

impl Reconciliation {
    /// Whether nothing entered or exited and nothing moved.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.entering.is_empty() && self.exiting.is_empty() && !self.reordered
    }
}

/// Validated incoming records with their identities.
#[derive(Debug, Clone, Default)]
pub struct JoinPlan {
    keyed: Vec<(Identity, Element)>,
}

impl JoinPlan {
    /// Derive every identity once and reject duplicates.
    pub fn new<F>(incoming: Vec<Element>, mut key_fn: F) -> Result<Self, FigureError>
    where
        F: FnMut(usize, &Element) -> Result<Identity, FigureError>,
    {
        let mut seen: HashMap<Identity, usize> = HashMap::with_capacity(incoming.len());
        let mut keyed = Vec::with_capacity(incoming.len());
        for (index, element) in incoming.into_iter().enumerate() {
            let identity = key_fn(index, &element)?;
            if let Some(&first) = seen.get(&identity) {
                return Err(FigureError::DuplicateIdentity {
                    identity,
                    first,
                    second: index,
                });
            }
            seen.insert(identity.clone(), index);
            keyed.push((identity, element));
        }
        Ok(Self { keyed })
    }

    /// Number of incoming records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keyed.len()
    }

    /// Whether the plan holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyed.is_empty()
    }

    /// Planned records in incoming order.
    pub fn records(&self) -> impl Iterator<Item = &Element> {
        self.keyed.iter().map(|(_, element)| element)
    }
}

/// Identity-keyed set of visual elements of one layer.
#[derive(Debug)]
pub struct KeyedElements {
    layer: &'static str,
    by_identity: HashMap<Identity, VisualElement>,
    order: Vec<Identity>,
    next_serial: u64,
}

impl KeyedElements {
    /// Create an empty set for `layer`.
    #[must_use]
    pub fn new(layer: &'static str) -> Self {
        Self {
            layer,
            by_identity: HashMap::new(),
            order: Vec::new(),
            next_serial: 0,
        }
    }

    /// Layer name.
    #[must_use]
    pub const fn layer(&self) -> &'static str {
        self.layer
    }

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no live elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up an element by identity.
    #[must_use]
    pub fn get(&self, identity: &Identity) -> Option<&VisualElement> {
        self.by_identity.get(identity)
    }

    /// Look up an element by identity for mutation.
    pub fn get_mut(&mut self, identity: &Identity) -> Option<&mut VisualElement> {
        self.by_identity.get_mut(identity)
    }

    /// Identities in render order.
    #[must_use]
    pub fn identities(&self) -> &[Identity] {
        &self.order
    }

    /// Nodes in render order.
    #[must_use]
    pub fn nodes_in_order(&self) -> Vec<NodeId> {
        self.order
            .iter()
            .filter_map(|id| self.by_identity.get(id).map(|e| e.node))
            .collect()
    }

    /// Elements in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &VisualElement> {
        self.by_identity.values()
    }

    /// Elements in arbitrary order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut VisualElement> {
        self.by_identity.values_mut()
    }

    /// Build a plan for this set.
    pub fn plan<F>(&self, incoming: Vec<Element>, key_fn: F) -> Result<JoinPlan, FigureError>
    where
        F: FnMut(usize, &Element) -> Result<Identity, FigureError>,
    {
        JoinPlan::new(incoming, key_fn)
    }

    /// Match a validated plan against the map and replace it.
    ///
    /// Exited elements are handed back to the caller, which owns their removal.
    pub fn apply(&mut self, plan: JoinPlan) -> Reconciliation {
        let mut previous = std::mem::take(&mut self.by_identity);
        let previous_order = std::mem::take(&mut self.order);
        let mut result = Reconciliation::default();

        let mut next = HashMap::with_capacity(plan.keyed.len());
        let mut order = Vec::with_capacity(plan.keyed.len());
        for (index, (identity, datum)) in plan.keyed.into_iter().enumerate() {
            let element = if let Some(mut existing) = previous.remove(&identity) {
                existing.datum = datum;
                result.updating.push(Joined {
                    identity: identity.clone(),
                    node: existing.node,
                    index,
                });
                existing
            } else {
                let node = NodeId::new(self.layer, self.next_serial);
                self.next_serial += 1;
                result.entering.push(Joined {
                    identity: identity.clone(),
                    node,
                    index,
                });
                VisualElement {
                    identity: identity.clone(),
                    node,
                    datum,
                    classes: BTreeSet::new(),
                    interaction: Interaction::default(),
                    motion: Motion::default(),
                }
            };
            order.push(identity.clone());
            next.insert(identity, element);
        }

        let survivors_before: Vec<&Identity> = previous_order
            .iter()
            .filter(|id| next.contains_key(*id) && !previous.contains_key(*id))
            .collect();
        let survivors_after = result.updating.iter().map(|j| &j.identity);
        result.reordered = !survivors_before.into_iter().eq(survivors_after);

        for identity in previous_order {
            if let Some(gone) = previous.remove(&identity) {
                result.exiting.push(gone);
            }
        }

        self.by_identity = next;
        self.order = order;

        log::debug!(
            "reconciled layer '{}': {} entering, {} updating, {} exiting",
            self.layer,
            result.entering.len(),
            result.updating.len(),
            result.exiting.len()
        );
        result
    }
}

/// Reconcile `incoming` against `previous`, replacing its map on success.
///
/// If the key function fails for any record, `previous` is left untouched.
pub fn reconcile<F>(
    previous: &mut KeyedElements,
    incoming: Vec<Element>,
    key_fn: F,
) -> Result<Reconciliation, FigureError>
where
    F: FnMut(usize, &Element) -> Result<Identity, FigureError>,
{
    let plan = previous.plan(incoming, key_fn)?;
    Ok(previous.apply(plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::KeyRule;
    use proptest::prelude::*;

    fn by_key(index: usize, e: &Element) -> Result<Identity, FigureError> {
        KeyRule::Key.extract(index, e)
    }

    fn ids(joined: &[Joined]) -> Vec<String> {
        joined.iter().map(|j| j.identity.to_string()).collect()
    }

    #[test]
    fn test_enter_update_exit_scenario() {
        let mut keyed = KeyedElements::new("bars");
        reconcile(
            &mut keyed,
            vec![Element::keyed("a", 10.0), Element::keyed("b", 20.0)],
            by_key,
        )
        .unwrap();

        let rec = reconcile(
            &mut keyed,
            vec![Element::keyed("b", 25.0), Element::keyed("c", 5.0)],
            by_key,
        )
        .unwrap();

        assert_eq!(ids(&rec.entering), vec!["c"]);
        assert_eq!(ids(&rec.updating), vec!["b"]);
        assert_eq!(rec.exiting.len(), 1);
        assert_eq!(rec.exiting[0].identity, Identity::text("a"));
        assert_eq!(keyed.get(&Identity::text("b")).unwrap().datum.value, 25.0);
        assert!(keyed.get(&Identity::text("a")).is_none());
        assert_eq!(keyed.identities(), &[Identity::text("b"), Identity::text("c")]);
    }

    #[test]
    fn test_survivor_keeps_node() {
        let mut keyed = KeyedElements::new("bars");
        let first = reconcile(&mut keyed, vec![Element::keyed("a", 1.0)], by_key).unwrap();
        let second = reconcile(&mut keyed, vec![Element::keyed("a", 2.0)], by_key).unwrap();
        assert_eq!(first.entering[0].node, second.updating[0].node);
    }

    #[test]
    fn test_new_nodes_get_fresh_serials() {
        let mut keyed = KeyedElements::new("bars");
        let first = reconcile(&mut keyed, vec![Element::keyed("a", 1.0)], by_key).unwrap();
        reconcile(&mut keyed, vec![], by_key).unwrap();
        let again = reconcile(&mut keyed, vec![Element::keyed("a", 1.0)], by_key).unwrap();
        assert_ne!(first.entering[0].node, again.entering[0].node);
    }

    #[test]
    fn test_duplicate_identity_fails_fast() {
        let mut keyed = KeyedElements::new("bars");
        reconcile(&mut keyed, vec![Element::keyed("a", 1.0)], by_key).unwrap();

        let err = reconcile(
            &mut keyed,
            vec![
                Element::keyed("x", 1.0),
                Element::keyed("y", 1.0),
                Element::keyed("x", 2.0),
            ],
            by_key,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            FigureError::DuplicateIdentity {
                first: 0,
                second: 2,
                ..
            }
        ));
        assert_eq!(keyed.identities(), &[Identity::text("a")]);
    }

    #[test]
    fn test_failing_key_rule_leaves_state() {
        let mut keyed = KeyedElements::new("bars");
        reconcile(&mut keyed, vec![Element::keyed("a", 1.0)], by_key).unwrap();

        let err = reconcile(
            &mut keyed,
            vec![Element::keyed("b", 1.0), Element::default()],
            by_key,
        )
        .unwrap_err();

        assert!(matches!(err, FigureError::MissingKey { index: 1, .. }));
        assert_eq!(keyed.len(), 1);
        assert!(keyed.get(&Identity::text("a")).is_some());
    }

    #[test]
    fn test_key_fn_called_once_per_record() {
        let mut keyed = KeyedElements::new("bars");
        let mut calls = 0;
        reconcile(
            &mut keyed,
            vec![Element::keyed("a", 1.0), Element::keyed("b", 1.0)],
            |i, e| {
                calls += 1;
                by_key(i, e)
            },
        )
        .unwrap();
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_reordered_flag() {
        let mut keyed = KeyedElements::new("rows");
        reconcile(
            &mut keyed,
            vec![Element::keyed("a", 1.0), Element::keyed("b", 1.0)],
            by_key,
        )
        .unwrap();

        let same = reconcile(
            &mut keyed,
            vec![Element::keyed("a", 2.0), Element::keyed("b", 2.0)],
            by_key,
        )
        .unwrap();
        assert!(same.is_stable());

        let swapped = reconcile(
            &mut keyed,
            vec![Element::keyed("b", 2.0), Element::keyed("a", 2.0)],
            by_key,
        )
        .unwrap();
        assert!(swapped.reordered);
        assert_eq!(keyed.nodes_in_order().len(), 2);
    }

    #[test]
    fn test_empty_to_empty() {
        let mut keyed = KeyedElements::new("bars");
        let rec = reconcile(&mut keyed, vec![], by_key).unwrap();
        assert!(rec.is_stable());
        assert!(keyed.is_empty());
    }

    fn elements(keys: &[u8]) -> Vec<Element> {
        keys.iter()
            .map(|k| Element::keyed(i64::from(*k), f64::from(*k)))
            .collect()
    }

    proptest! {
        #[test]
        fn prop_reconcile_partitions_sets(
            a in proptest::collection::btree_set(0u8..40, 0..30),
            b in proptest::collection::btree_set(0u8..40, 0..30),
        ) {
            let a: Vec<u8> = a.into_iter().collect();
            let b: Vec<u8> = b.into_iter().rev().collect();
            let mut keyed = KeyedElements::new("p");
            reconcile(&mut keyed, elements(&a), by_key).unwrap();
            let rec = reconcile(&mut keyed, elements(&b), by_key).unwrap();

            let both = a.iter().filter(|k| b.contains(k)).count();
            prop_assert_eq!(rec.updating.len(), both);
            prop_assert_eq!(rec.exiting.len(), a.len() - both);
            prop_assert_eq!(rec.entering.len(), b.len() - both);
            prop_assert!(rec
                .entering
                .iter()
                .all(|e| !rec.updating.iter().any(|u| u.identity == e.identity)));
            prop_assert_eq!(keyed.len(), b.len());
        }

        #[test]
        fn prop_reconcile_is_idempotent(keys in proptest::collection::btree_set(0u8..60, 0..40)) {
            let keys: Vec<u8> = keys.into_iter().collect();
            let mut keyed = KeyedElements::new("p");
            reconcile(&mut keyed, elements(&keys), by_key).unwrap();
            let rec = reconcile(&mut keyed, elements(&keys), by_key).unwrap();
            prop_assert!(rec.entering.is_empty());
            prop_assert!(rec.exiting.is_empty());
            prop_assert_eq!(rec.updating.len(), keys.len());
            prop_assert!(!rec.reordered);
        }

        #[test]
        fn prop_render_order_follows_incoming(keys in proptest::collection::vec(0u8..100, 0..40)) {
            let mut unique = Vec::new();
            for k in keys {
                if !unique.contains(&k) {
                    unique.push(k);
                }
            }
            let mut keyed = KeyedElements::new("p");
            reconcile(&mut keyed, elements(&unique), by_key).unwrap();
            let expected: Vec<Identity> = unique.iter().map(|k| Identity::Number(i64::from(*k))).collect();
            prop_assert_eq!(keyed.identities(), expected.as_slice());
        }
    }
}
