//! Bipartite user/item interaction graph.
//!
//! The graph owns every [`UserNode`] and [`ItemNode`]. Nodes are created
//! lazily the first time an interaction references them and are never
//! removed. Each edge is stored twice, once in the user's profile and once in
//! the item's profile, and both copies always carry the same weight.

pub mod norm;
mod options;


use std::ops::Deref;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub use norm::{Norm, NormKind, NormPolicy};
pub use options::GraphOptions;

/// One observed `(user, item, weight)` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// User identifier.
    pub user_id: String,
    /// Item identifier.
    pub item_id: String,
    /// Affinity strength, 1.0 when the source does not carry one.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Interaction {
    /// Builds an interaction with an explicit weight.
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, weight: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            weight,
        }
    }

    /// Builds an interaction with the default weight of 1.0.
    pub fn unweighted(user_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self::new(user_id, item_id, default_weight())
    }
}

/// Weighted edges incident to one node, keyed by the opposite node's id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    weights: FxHashMap<String, f64>,
}

impl Profile {
    /// Weight of the edge to `id`, or 0 when there is none.
    pub fn weight(&self, id: &str) -> f64 {
        self.weights.get(id).copied().unwrap_or(0.0)
    }

    /// Weight of the edge to `id`, if present.
    pub fn get(&self, id: &str) -> Option<f64> {
        self.weights.get(id).copied()
    }

    /// Whether an edge to `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.weights.contains_key(id)
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the profile has no edges.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterates `(opposite id, weight)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.weights.iter().map(|(id, w)| (id.as_str(), *w))
    }

    /// Iterates the opposite node ids.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.weights.keys().map(String::as_str)
    }

    /// Iterates the weights.
    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.weights.values().copied()
    }

    /// Stores `max(weight, current)` where a missing entry counts as 0.
    /// Returns `true` when the entry did not exist before.
    pub(crate) fn merge_max(&mut self, id: &str, weight: f64) -> bool {
        match self.weights.get_mut(id) {
            Some(current) => {
                if weight > *current {
                    *current = weight;
                }
                false
            }
            None => {
                self.weights.insert(id.to_string(), weight.max(0.0));
                true
            }
        }
    }
}

/// State shared by user and item nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    pub(crate) profile: Profile,
    pub(crate) norm: Norm,
}

impl Node {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            profile: Profile::default(),
            norm: Norm::ZERO,
        }
    }

    /// Node identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Incident weighted edges.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Cached norm and its freshness.
    pub fn norm(&self) -> Norm {
        self.norm
    }
}

/// An item node. Its profile maps user ids to weights.
pub type ItemNode = Node;

/// A user judged similar to another user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbour {
    /// The neighbouring user.
    pub user_id: String,
    /// Cosine similarity between the two profiles.
    pub similarity: f64,
}

/// A user node. Its profile maps item ids to weights.
#[derive(Debug, Clone, PartialEq)]
pub struct UserNode {
    node: Node,
    neighbours: Vec<Neighbour>,
}

impl UserNode {
    fn new(id: &str) -> Self {
        Self {
            node: Node::new(id),
            neighbours: Vec::new(),
        }
    }

    /// Neighbours from the last detection pass, most similar first. Empty
    /// until [`crate::neighbours::detect_neighbours`] has run.
    pub fn neighbours(&self) -> &[Neighbour] {
        &self.neighbours
    }
}

impl Deref for UserNode {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

/// The user/item graph.
pub struct Graph {
    users: FxHashMap<String, UserNode>,
    items: FxHashMap<String, ItemNode>,
    options: GraphOptions,
    edge_count: usize,
    mutations: u64,
    neighbours_epoch: Option<u64>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("users", &self.users.len())
            .field("items", &self.items.len())
            .field("edges", &self.edge_count)
            .field("options", &self.options)
            .field("mutations", &self.mutations)
            .field("neighbours_epoch", &self.neighbours_epoch)
            .finish()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}

impl Graph {
    /// Creates an empty graph.
    pub fn new(options: GraphOptions) -> Self {
        Self {
            users: FxHashMap::default(),
            items: FxHashMap::default(),
            options,
            edge_count: 0,
            mutations: 0,
            neighbours_epoch: None,
        }
    }

    /// Builds a graph from a sequence of interactions.
    pub fn from_interactions<'a, I>(options: GraphOptions, interactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Interaction>,
    {
        let mut graph = Self::new(options);
        graph.extend(interactions);
        graph
    }

    /// Options the graph was created with.
    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// Norm formula in use.
    pub fn norm_kind(&self) -> NormKind {
        self.options.norm_kind
    }

    /// Adds or strengthens the edge between `user_id` and `item_id`.
    ///
    /// Missing nodes are created. The stored weight becomes
    /// `max(weight, previous)`, with a missing edge counting as 0, on both the
    /// user and the item side. Under [`NormPolicy::Eager`] both norms are
    /// recomputed before returning; under [`NormPolicy::Deferred`] they are
    /// marked stale. No validation is performed, see
    /// [`Graph::try_put_interaction`].
    pub fn put_interaction(&mut self, user_id: &str, item_id: &str, weight: f64) {
        let metrics = &self.options.metrics;
        metrics.interaction_inserted();

        let user = self
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| {
                metrics.node_created("user");
                UserNode::new(user_id)
            });
        let item = self
            .items
            .entry(item_id.to_string())
            .or_insert_with(|| {
                metrics.node_created("item");
                Node::new(item_id)
            });

        if user.node.profile.merge_max(item_id, weight) {
            self.edge_count += 1;
        }
        item.profile.merge_max(user_id, weight);

        match self.options.norm_policy {
            NormPolicy::Eager => {
                norm::update_norm(&mut user.node, self.options.norm_kind);
                norm::update_norm(item, self.options.norm_kind);
            }
            NormPolicy::Deferred => {
                user.node.norm.invalidate();
                item.norm.invalidate();
            }
        }
        self.mutations += 1;
    }

    /// Validating form of [`Graph::put_interaction`] that rejects negative
    /// and non-finite weights.
    pub fn try_put_interaction(&mut self, user_id: &str, item_id: &str, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::invalid_weight(user_id, item_id, weight));
        }
        self.put_interaction(user_id, item_id, weight);
        Ok(())
    }

    /// Inserts every interaction in order.
    pub fn extend<'a, I>(&mut self, interactions: I)
    where
        I: IntoIterator<Item = &'a Interaction>,
    {
        let mut inserted = 0usize;
        for interaction in interactions {
            self.put_interaction(&interaction.user_id, &interaction.item_id, interaction.weight);
            inserted += 1;
        }
        debug!(
            inserted,
            users = self.users.len(),
            items = self.items.len(),
            edges = self.edge_count,
            "pathrec.graph.extend"
        );
    }

    /// Recomputes every stale norm. Returns the number of nodes refreshed.
    pub fn refresh_norms(&mut self) -> usize {
        let kind = self.options.norm_kind;
        let mut refreshed = 0;
        for user in self.users.values_mut() {
            if user.node.norm.is_stale() {
                norm::update_norm(&mut user.node, kind);
                refreshed += 1;
            }
        }
        for item in self.items.values_mut() {
            if item.norm.is_stale() {
                norm::update_norm(item, kind);
                refreshed += 1;
            }
        }
        debug!(refreshed, "pathrec.graph.refresh_norms");
        refreshed
    }

    /// Norm of `node`, computed on the fly when the cached value is stale.
    pub fn norm_of(&self, node: &Node) -> f64 {
        norm::current_norm(node, self.options.norm_kind)
    }

    /// Looks up a user without creating it.
    pub fn user(&self, user_id: &str) -> Option<&UserNode> {
        self.users.get(user_id)
    }

    /// Looks up an item without creating it.
    pub fn item(&self, item_id: &str) -> Option<&ItemNode> {
        self.items.get(item_id)
    }

    /// Iterates all users in unspecified order.
    pub fn users(&self) -> impl Iterator<Item = &UserNode> + '_ {
        self.users.values()
    }

    /// Iterates all items in unspecified order.
    pub fn items(&self) -> impl Iterator<Item = &ItemNode> + '_ {
        self.items.values()
    }

    /// Number of user nodes.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of item nodes.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of distinct user/item edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Whether the stored neighbour lists were computed after the last
    /// insertion.
    pub fn neighbours_are_current(&self) -> bool {
        self.neighbours_epoch == Some(self.mutations)
    }

    pub(crate) fn store_neighbours(&mut self, lists: Vec<(String, Vec<Neighbour>)>) {
        for (user_id, neighbours) in lists {
            if let Some(user) = self.users.get_mut(&user_id) {
                user.neighbours = neighbours;
            }
        }
        self.neighbours_epoch = Some(self.mutations);
    }
}
