/// Packed entity handle: an index selecting a slot and a version telling
/// successive occupants of that slot apart.
///
/// The all-ones index is reserved for [`Entity::NULL`] and the all-ones
/// version for [`Entity::TOMBSTONE`]; neither ever names a live entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

impl Entity {
    pub const VERSION_BITS: u32 = 12;
    pub const INDEX_BITS: u32 = 20;
    pub const VERSION_MASK: u32 = (1 << Self::VERSION_BITS) - 1;
    pub const INDEX_MASK: u32 = (1 << Self::INDEX_BITS) - 1;

    /// Null handle. Compared on the index field only.
    pub const NULL: Entity = Entity(u32::MAX);

    /// Tombstone handle. Compared on the version field only.
    pub const TOMBSTONE: Entity = Entity(u32::MAX);

    #[inline(always)]
    /// Create a new Entity from index and version
    pub const fn new(index: u32, version: u32) -> Self {
        let index = index & Self::INDEX_MASK;
        let version = version & Self::VERSION_MASK;

        Entity((index << Self::VERSION_BITS) | version)
    }

    #[inline(always)]
    pub const fn from_bits(bits: u32) -> Self {
        Entity(bits)
    }

    #[inline(always)]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn index(self) -> u32 {
        (self.0 >> Self::VERSION_BITS) & Self::INDEX_MASK
    }

    #[inline(always)]
    pub const fn version(self) -> u32 {
        self.0 & Self::VERSION_MASK
    }

    #[inline(always)]
    pub const fn is_null(self) -> bool {
        self.index() == Self::INDEX_MASK
    }

    #[inline(always)]
    pub const fn is_tombstone(self) -> bool {
        self.version() == Self::VERSION_MASK
    }

    #[inline(always)]
    /// Same index, version + 1. The tombstone version is skipped, so the
    /// version wraps straight to 0.
    pub const fn next(self) -> Self {
        let version = self.version() + 1;
        let version = if version >= Self::VERSION_MASK { 0 } else { version };

        Entity::new(self.index(), version)
    }

    #[inline(always)]
    pub(crate) const fn with_version(self, version: u32) -> Self {
        Entity::new(self.index(), version)
    }
}

impl Default for Entity {
    fn default() -> Self {
        Entity::NULL
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            return write!(f, "Entity(null, version = {})", self.version());
        }

        write!(
            f,
            "Entity(id = {}, version = {})",
            self.index(),
            self.version()
        )
    }
}

#[cfg(test)]
#[path = "entity.tests.rs"]
mod tests;
