/// Returned by lookups that require the key to be present, like
/// [`AvlTree::try_get`][crate::avl::AvlTree::try_get].
///
/// Mutations never produce this. Inserting an existing key overwrites its value and removing a
/// missing key does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("key not found")]
pub struct KeyError;
