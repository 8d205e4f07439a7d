/// Names one of the two child slots of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    /// The change in a node's balance factor when the subtree on this side grows by one level.
    /// Balance is `height(right) - height(left)` so growth on the left pulls it negative.
    pub(crate) fn diff(self) -> i8 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }

    pub(crate) fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}
