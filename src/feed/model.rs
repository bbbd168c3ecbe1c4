use serde::Serialize;

use crate::post::model::Post;

use super::Filter;

/// A feed post joined with its author's roles and badges.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct FeedItem {
    #[serde(flatten)]
    pub post: Post,
    pub author_roles: Vec<String>,
    pub author_badges: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    LoadingMore,
}

#[derive(Clone, Debug, Serialize)]
pub struct Page {
    pub filter: Filter,
    pub items: Vec<FeedItem>,
    pub has_more: bool,
    pub phase: Phase,
}
