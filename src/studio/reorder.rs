//! Client-side list splice used to move an item within its module.

/// Removes the element at `from` and inserts it at `to`, clamped to the end
/// of the list. Returns `false` and leaves `list` untouched if `from` is out
/// of range.
pub fn splice<T>(list: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= list.len() {
        return false;
    }
    let moved = list.remove(from);
    let to = to.min(list.len());
    list.insert(to, moved);
    true
}
