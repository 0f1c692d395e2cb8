//! Object classification tags

use serde::{Deserialize, Serialize};

/// Classification marker attached to scene objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectTag {
    Wall,
    /// Point at a wall's end that following walls attach to
    EndAnchor,
    /// Bounding envelope of an assembly
    Cage,
    Cabinet,
    Appliance,
    Door,
    Window,
    Obstacle,
    /// Generated panel inside an assembly
    Part,
    Annotation,
    /// Temporary object shown during an interactive placement
    Preview,
}

impl ObjectTag {
    pub const ALL: [ObjectTag; 11] = [
        ObjectTag::Wall,
        ObjectTag::EndAnchor,
        ObjectTag::Cage,
        ObjectTag::Cabinet,
        ObjectTag::Appliance,
        ObjectTag::Door,
        ObjectTag::Window,
        ObjectTag::Obstacle,
        ObjectTag::Part,
        ObjectTag::Annotation,
        ObjectTag::Preview,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Openings cut through the wall and block both faces
    pub fn is_opening(self) -> bool {
        matches!(self, ObjectTag::Door | ObjectTag::Window)
    }
}

/// Small set of tags stored as a bitset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<ObjectTag>", into = "Vec<ObjectTag>")]
pub struct TagSet(u16);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: ObjectTag) -> Self {
        self.insert(tag);
        self
    }

    pub fn insert(&mut self, tag: ObjectTag) {
        self.0 |= tag.bit();
    }

    pub fn remove(&mut self, tag: ObjectTag) {
        self.0 &= !tag.bit();
    }

    pub fn contains(&self, tag: ObjectTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectTag> + '_ {
        ObjectTag::ALL.into_iter().filter(|t| self.contains(*t))
    }

    /// True if any door or window tag is present
    pub fn is_opening(&self) -> bool {
        self.iter().any(ObjectTag::is_opening)
    }
}

impl From<ObjectTag> for TagSet {
    fn from(tag: ObjectTag) -> Self {
        TagSet::new().with(tag)
    }
}

impl<const N: usize> From<[ObjectTag; N]> for TagSet {
    fn from(tags: [ObjectTag; N]) -> Self {
        tags.into_iter().collect()
    }
}

impl FromIterator<ObjectTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = ObjectTag>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl From<Vec<ObjectTag>> for TagSet {
    fn from(tags: Vec<ObjectTag>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<TagSet> for Vec<ObjectTag> {
    fn from(set: TagSet) -> Self {
        set.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut set = TagSet::from([ObjectTag::Cage, ObjectTag::Cabinet]);
        assert!(set.contains(ObjectTag::Cage));
        assert!(!set.contains(ObjectTag::Wall));
        set.remove(ObjectTag::Cage);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![ObjectTag::Cabinet]);
    }

    #[test]
    fn test_opening() {
        assert!(TagSet::from([ObjectTag::Cage, ObjectTag::Window]).is_opening());
        assert!(!TagSet::from(ObjectTag::Cabinet).is_opening());
    }
}
