use crate::coerce::TargetType;

/// Visibility of a member from outside the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `pub` field: a property.
    Public,
    /// Private storage, typically a backing field.
    NonPublic,
}

/// One settable (or read-only) slot of an entity.
///
/// Position in `Shape.members` is the handle the resolver caches and
/// `Entity::assign` dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    /// Declared name, possibly overridden with `#[member(name = "...")]`.
    pub name: &'static str,
    pub access: Access,
    pub writable: bool,
    /// Target type after unwrapping `Option`.
    pub target: TargetType,
    pub nullable: bool,
}

impl Member {
    /// Case-insensitive name match. Non-public members also match with their
    /// leading underscore dropped, so `_userName` answers to `UserName`.
    pub fn matches(&self, column: &str) -> bool {
        if names_equal(self.name, column) {
            return true;
        }
        match (self.access, self.name.strip_prefix('_')) {
            (Access::NonPublic, Some(bare)) => names_equal(bare, column),
            _ => false,
        }
    }
}

/// Compile-time layout of an entity type.
#[derive(Debug)]
pub struct Shape {
    pub name: &'static str,
    pub members: &'static [Member],
}

impl Shape {
    pub fn member(&self, index: usize) -> Option<&'static Member> {
        self.members.get(index)
    }
}

/// Unicode-aware case-insensitive comparison, with an ASCII fast path.
pub fn names_equal(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
