//! 消息模块 - taxonomy change notifications
//!
//! - [`NotificationBus`]: fans out [`TreeReplaced`] to forms, navigation and filters
//! - [`Subscription`]: RAII handle for a registered handler

pub mod bus;

pub use bus::{NotificationBus, Subscription};

use std::fmt;
use std::sync::Arc;

use shared::models::TaxonomyTree;

/// Default capacity of the async broadcast channel
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Immutable, shareable view of the whole tree
///
/// A published snapshot is never mutated afterwards; later changes produce
/// a new `Arc`.
pub type TreeSnapshot = Arc<TaxonomyTree>;

/// Why the tree was replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeCause {
    /// A local engine operation committed
    Mutation,
    /// Another context wrote the document
    ExternalChange,
    /// The engine re-read the document on request
    Reload,
}

impl fmt::Display for ChangeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeCause::Mutation => write!(f, "mutation"),
            ChangeCause::ExternalChange => write!(f, "external_change"),
            ChangeCause::Reload => write!(f, "reload"),
        }
    }
}

/// "Tree replaced" event
#[derive(Debug, Clone)]
pub struct TreeReplaced {
    pub tree: TreeSnapshot,
    pub cause: ChangeCause,
}
