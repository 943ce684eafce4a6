//! Price propagation: a two-phase mark/compute walk over items and recipes.
//!
//! Marking collects every node whose price may change. Computing then prices
//! each marked node once its direct prerequisites have been priced in the same
//! pass; a node whose prerequisite is still pending reports
//! [`PriceOutcome::NotYetComputed`] and is retried when that prerequisite
//! resolves. Nodes that never resolve sit on a cycle; [`PropagationPass::finish`]
//! settles them using the stored price of their pending prerequisites.

use craft_core::{EconomyGraph, Item, Recipe};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::error::EngineError;
use crate::pricing::{price_recipe, ProductionConditions};

/// A priceable node of the graph.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeRef {
    Item(String),
    Recipe(String),
}

impl NodeRef {
    pub fn item(name: impl Into<String>) -> Self {
        NodeRef::Item(name.into())
    }

    pub fn recipe(name: impl Into<String>) -> Self {
        NodeRef::Recipe(name.into())
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Item(name) => write!(f, "item {name}"),
            NodeRef::Recipe(name) => write!(f, "recipe {name}"),
        }
    }
}

/// Result of one attempt at pricing a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PriceOutcome {
    /// The node's new price.
    Ready(Decimal),
    /// A prerequisite is marked for update but not yet updated.
    NotYetComputed(NodeRef),
}

/// Counters of a finished pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Nodes marked for update.
    pub marked: usize,
    /// Nodes priced, including settled ones.
    pub computed: usize,
    /// Nodes priced from placeholder prerequisites because they sit on a cycle.
    pub settled: usize,
}

/// What a mutation did to the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The graph changed and prices were propagated.
    Applied(PassSummary),
    /// Nothing to do; the graph is untouched.
    Ignored,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }
}

/// Nodes whose price depends directly on `node`.
///
/// An item feeds the recipes consuming it and the recipes crediting it as a
/// byproduct; a recipe feeds its main product.
fn dependents(graph: &EconomyGraph, node: &NodeRef) -> Vec<NodeRef> {
    match node {
        NodeRef::Item(name) => match graph.items.get(name) {
            Some(item) => item
                .used_in_recipes
                .iter()
                .chain(&item.byproduct_of_recipes)
                .filter(|r| graph.recipes.contains_key(*r))
                .map(|r| NodeRef::Recipe(r.clone()))
                .collect(),
            None => Vec::new(),
        },
        NodeRef::Recipe(name) => match graph.recipes.get(name) {
            Some(recipe) if graph.is_product(&recipe.main_product.name) => {
                vec![NodeRef::Item(recipe.main_product.name.clone())]
            }
            _ => Vec::new(),
        },
    }
}

/// Bookkeeping for one mutation's propagation. Create a fresh pass per
/// mutation; it borrows nothing and leaves nothing behind in the graph.
#[derive(Debug, Default)]
pub struct PropagationPass {
    marking: BTreeSet<NodeRef>,
    marked: BTreeSet<NodeRef>,
    expanded: BTreeSet<NodeRef>,
    deferred: Vec<NodeRef>,
    settled: usize,
}

impl PropagationPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `root` and everything downstream of it for update.
    pub fn mark(&mut self, graph: &EconomyGraph, root: NodeRef) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if self.marking.contains(&node) {
                continue;
            }
            stack.extend(dependents(graph, &node));
            self.marking.insert(node);
        }
    }

    pub fn is_marked_for_update(&self, node: &NodeRef) -> bool {
        self.marking.contains(node)
    }

    /// A node can be read when it was never marked, or was already priced.
    pub fn has_updated(&self, node: &NodeRef) -> bool {
        !self.marking.contains(node) || self.marked.contains(node)
    }

    /// Price `root`, then walk outward through its dependents.
    pub fn compute(&mut self, graph: &mut EconomyGraph, root: NodeRef) -> Result<(), EngineError> {
        self.drain(graph, vec![root])
    }

    /// Settle the nodes left pending by a cycle and report what the pass did.
    pub fn finish(mut self, graph: &mut EconomyGraph) -> Result<PassSummary, EngineError> {
        while let Some(node) = self.next_pending() {
            let price = match self.attempt(graph, &node, false)? {
                PriceOutcome::Ready(price) => price,
                // lenient attempts never wait
                PriceOutcome::NotYetComputed(_) => continue,
            };
            debug!(%node, %price, "settled cyclic node from placeholder prices");
            self.settled += 1;
            self.resolve(graph, &node, price)?;
            let next = dependents(graph, &node);
            self.drain(graph, next)?;
        }
        Ok(PassSummary {
            marked: self.marking.len(),
            computed: self.marked.len(),
            settled: self.settled,
        })
    }

    fn next_pending(&mut self) -> Option<NodeRef> {
        let marked = &self.marked;
        self.deferred.retain(|node| !marked.contains(node));
        if self.deferred.is_empty() {
            return None;
        }
        Some(self.deferred.remove(0))
    }

    fn drain(&mut self, graph: &mut EconomyGraph, mut stack: Vec<NodeRef>) -> Result<(), EngineError> {
        while let Some(node) = stack.pop() {
            if self.marked.contains(&node) {
                continue;
            }
            match self.attempt(graph, &node, true)? {
                PriceOutcome::Ready(price) => {
                    self.resolve(graph, &node, price)?;
                    stack.extend(dependents(graph, &node));
                }
                PriceOutcome::NotYetComputed(waiting_on) => {
                    debug!(%node, %waiting_on, "deferred until prerequisite updates");
                    if !self.deferred.contains(&node) {
                        self.deferred.push(node.clone());
                    }
                    // keep walking outward, but only once per deferred node
                    if self.expanded.insert(node.clone()) {
                        stack.extend(dependents(graph, &node));
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve(&mut self, graph: &mut EconomyGraph, node: &NodeRef, price: Decimal) -> Result<(), EngineError> {
        match node {
            NodeRef::Item(name) => graph.item_mut(name)?.price = price,
            NodeRef::Recipe(name) => graph.recipe_mut(name)?.price = price,
        }
        self.marked.insert(node.clone());
        Ok(())
    }

    fn attempt(&self, graph: &EconomyGraph, node: &NodeRef, strict: bool) -> Result<PriceOutcome, EngineError> {
        match node {
            NodeRef::Item(name) => self.item_price(graph, graph.item(name)?, strict),
            NodeRef::Recipe(name) => self.recipe_price(graph, graph.recipe(name)?, strict),
        }
    }

    /// `Err` if `node` must wait, when `strict`.
    fn check(&self, node: NodeRef, strict: bool) -> Result<(), NodeRef> {
        if strict && !self.has_updated(&node) {
            return Err(node);
        }
        Ok(())
    }

    fn item_price(&self, graph: &EconomyGraph, item: &Item, strict: bool) -> Result<PriceOutcome, EngineError> {
        if item.product_of_recipes.is_empty() {
            // user supplied
            return Ok(PriceOutcome::Ready(item.price));
        }
        let mut price = Decimal::MAX;
        for name in &item.product_of_recipes {
            if let Err(waiting_on) = self.check(NodeRef::recipe(name.as_str()), strict) {
                return Ok(PriceOutcome::NotYetComputed(waiting_on));
            }
            price = price.min(graph.recipe(name)?.price);
        }
        Ok(PriceOutcome::Ready(price))
    }

    fn recipe_price(&self, graph: &EconomyGraph, recipe: &Recipe, strict: bool) -> Result<PriceOutcome, EngineError> {
        let station = graph.station_for_recipe(recipe)?;
        let profession = graph.profession(&station.profession)?;

        let mut prices = Vec::with_capacity(recipe.ingredients.len());
        for ingredient in &recipe.ingredients {
            let item = graph.ingredient_item(&ingredient.reference)?;
            if let Err(waiting_on) = self.check(NodeRef::item(item.name.as_str()), strict) {
                return Ok(PriceOutcome::NotYetComputed(waiting_on));
            }
            prices.push(item.price);
        }

        let byproduct_price = match &recipe.byproduct {
            Some(byproduct) => {
                let item = graph.item(&byproduct.name)?;
                if let Err(waiting_on) = self.check(NodeRef::item(item.name.as_str()), strict) {
                    return Ok(PriceOutcome::NotYetComputed(waiting_on));
                }
                Some(item.price)
            }
            None => None,
        };

        let conditions = ProductionConditions {
            upgrade_level: station.upgrade_level,
            skill_level: profession.level,
            lavish_workspace: profession.has_lavish_workspace,
            calorie_cost: graph.calorie_cost,
            global_margin: graph.margin,
        };
        let cost = price_recipe(recipe, &prices, byproduct_price, &conditions)?;
        Ok(PriceOutcome::Ready(cost.unit_price))
    }
}

/// Mark every root, then compute every root, then settle cycles.
pub fn propagate(graph: &mut EconomyGraph, roots: &[NodeRef]) -> Result<PassSummary, EngineError> {
    let mut pass = PropagationPass::new();
    for root in roots {
        pass.mark(graph, root.clone());
    }
    for root in roots {
        pass.compute(graph, root.clone())?;
    }
    let summary = pass.finish(graph)?;
    debug!(
        roots = roots.len(),
        marked = summary.marked,
        computed = summary.computed,
        settled = summary.settled,
        "propagation pass finished"
    );
    Ok(summary)
}
