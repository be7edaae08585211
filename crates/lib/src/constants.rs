//! Constants used throughout the Orderable library.

/// Field holding a record's order key when the collection does not name one.
pub const DEFAULT_ORDER_FIELD: &str = "_order";

/// How many times a move re-resolves an item that changed domain while the
/// move waited for its lock.
pub const MAX_MOVE_ATTEMPTS: usize = 8;
