//! Norm maintenance for user and item profiles.

use serde::{Deserialize, Serialize};

use super::{Node, Profile};

/// Formula used to collapse a profile's weights into a norm.
///
/// Both variants compute `sqrt(sum(f(w)))` over the profile weights and differ
/// only in `f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormKind {
    /// `f(w) = w * w`, the Euclidean norm of the weight vector.
    #[default]
    Euclidean,
    /// `f(w) = w.powf(w)`.
    ///
    /// Identical to [`NormKind::Euclidean`] for unit weights, diverges for
    /// every other weight (and maps a zero weight to 1).
    SelfPower,
}

impl NormKind {
    /// Computes the norm of `profile` under this formula.
    pub fn compute(self, profile: &Profile) -> f64 {
        let sum: f64 = match self {
            NormKind::Euclidean => profile.weights().map(|w| w * w).sum(),
            NormKind::SelfPower => profile.weights().map(|w| w.powf(w)).sum(),
        };
        sum.sqrt()
    }

    /// Stable lowercase name used in logs and config files.
    pub fn as_str(self) -> &'static str {
        match self {
            NormKind::Euclidean => "euclidean",
            NormKind::SelfPower => "self_power",
        }
    }
}

/// When the graph recomputes norms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormPolicy {
    /// Recompute both endpoint norms inside every `put_interaction`.
    #[default]
    Eager,
    /// Mark norms stale on insertion; readers compute from the profile until
    /// [`super::Graph::refresh_norms`] runs.
    Deferred,
}

/// A cached norm together with its freshness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Norm {
    value: f64,
    stale: bool,
}

impl Norm {
    /// Norm of an empty profile. Fresh, since an empty profile has norm 0.
    pub const ZERO: Norm = Norm {
        value: 0.0,
        stale: false,
    };

    /// Returns the cached value, or `None` if the profile changed since it
    /// was computed.
    pub fn value(&self) -> Option<f64> {
        (!self.stale).then_some(self.value)
    }

    /// Whether the cached value predates the last profile mutation.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub(crate) fn invalidate(&mut self) {
        self.stale = true;
    }
}

impl Default for Norm {
    fn default() -> Self {
        Norm::ZERO
    }
}

/// Recomputes `node`'s norm from its current profile.
pub fn update_norm(node: &mut Node, kind: NormKind) {
    node.norm = Norm {
        value: kind.compute(&node.profile),
        stale: false,
    };
}

/// Returns the node's norm, computing it from the profile when the cached
/// value is stale. Never returns a value older than the profile.
pub fn current_norm(node: &Node, kind: NormKind) -> f64 {
    node.norm
        .value()
        .unwrap_or_else(|| kind.compute(&node.profile))
}

/// Divides `weight` by `norm`, mapping a zero norm to a zero contribution.
pub fn attenuate(weight: f64, norm: f64) -> f64 {
    if norm > 0.0 {
        weight / norm
    } else {
        0.0
    }
}
