//! Scope resolution
//!
//! Maps each orderable entity kind to the sibling group it is ranked in.
//! This is the only entity-specific part of the ordering core.

use std::fmt;

/// Every kind of record that carries a sibling position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    PrimaryCategory,
    MenuCategory,
    MenuItem,
    StoryCategory,
    Story,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::PrimaryCategory,
        EntityKind::MenuCategory,
        EntityKind::MenuItem,
        EntityKind::StoryCategory,
        EntityKind::Story,
    ];

    /// Name of the sibling collection (also the table name)
    pub fn table(&self) -> &'static str {
        match self {
            Self::PrimaryCategory => "primary_categories",
            Self::MenuCategory => "menu_categories",
            Self::MenuItem => "menu_items",
            Self::StoryCategory => "story_categories",
            Self::Story => "stories",
        }
    }

    /// Human-readable name, used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::PrimaryCategory => "Primary category",
            Self::MenuCategory => "Menu category",
            Self::MenuItem => "Menu item",
            Self::StoryCategory => "Story category",
            Self::Story => "Story",
        }
    }

    /// Kind of the record that groups this kind, if any
    pub fn parent_kind(&self) -> Option<EntityKind> {
        match self {
            Self::PrimaryCategory | Self::StoryCategory => None,
            Self::MenuCategory => Some(Self::PrimaryCategory),
            Self::MenuItem => Some(Self::MenuCategory),
            Self::Story => Some(Self::StoryCategory),
        }
    }

    /// Kind of the records grouped under this kind, if any
    pub fn child_kind(&self) -> Option<EntityKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.parent_kind() == Some(*self))
    }

    /// Whether every member must belong to a parent
    ///
    /// Menu categories may stay ungrouped; items and stories may not.
    pub fn requires_parent(&self) -> bool {
        matches!(self, Self::MenuItem | Self::Story)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Identifies one sibling group: all records of `kind` sharing `parent`
///
/// Ordered so that multi-scope operations can lock scopes in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeKey {
    kind: EntityKind,
    parent: Option<i64>,
}

impl ScopeKey {
    /// Build a scope, rejecting parent shapes the kind does not allow
    pub fn new(kind: EntityKind, parent: Option<i64>) -> Option<Self> {
        let valid = match (kind.parent_kind(), parent) {
            (None, None) => true,
            (None, Some(_)) => false,
            (Some(_), None) => !kind.requires_parent(),
            (Some(_), Some(_)) => true,
        };
        valid.then_some(Self { kind, parent })
    }

    pub fn primary_categories() -> Self {
        Self {
            kind: EntityKind::PrimaryCategory,
            parent: None,
        }
    }

    pub fn menu_categories(primary_category_id: Option<i64>) -> Self {
        Self {
            kind: EntityKind::MenuCategory,
            parent: primary_category_id,
        }
    }

    pub fn menu_items(category_id: i64) -> Self {
        Self {
            kind: EntityKind::MenuItem,
            parent: Some(category_id),
        }
    }

    pub fn story_categories() -> Self {
        Self {
            kind: EntityKind::StoryCategory,
            parent: None,
        }
    }

    pub fn stories(category_id: i64) -> Self {
        Self {
            kind: EntityKind::Story,
            parent: Some(category_id),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn parent(&self) -> Option<i64> {
        self.parent
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent {
            Some(parent) => write!(f, "{}:{}", self.kind.table(), parent),
            None => write!(f, "{}:root", self.kind.table()),
        }
    }
}

/// A reference to one orderable record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub kind: EntityKind,
    pub id: i64,
}

impl MemberRef {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.table(), self.id)
    }
}
