//! Consumers of the stores' live queries.

mod aggregator;
mod badge;

pub use aggregator::{DocumentListAggregator, ProfileTab};
pub use badge::{BadgeRenderer, TracingBadgeRenderer, UnreadBadge, UnreadCounterObserver, BADGE_CAP};
