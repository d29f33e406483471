//! Reorderable list control
//!
//! Holds an ordered sequence plus the selection and drag state needed to
//! reorder it from the keyboard. Every operation that changes the order
//! returns the full new sequence so the caller can persist or echo it;
//! operations that would not change anything return `None`.

/// Move the item at `from` so it ends up at index `to`.
///
/// Returns `None` when `from == to` or either index is out of range.
pub fn reorder<T: Clone>(items: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    if from == to || from >= items.len() || to >= items.len() {
        return None;
    }
    let mut next = items.to_vec();
    let moved = next.remove(from);
    next.insert(to, moved);
    Some(next)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    pub from: usize,
    pub over: usize,
}

#[derive(Debug, Clone)]
pub struct RankList<T> {
    items: Vec<T>,
    pub selected: usize,
    drag: Option<DragState>,
}

impl<T: Clone> RankList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            selected: 0,
            drag: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn drag(&self) -> Option<DragState> {
        self.drag
    }

    /// Replace the whole sequence (e.g. from a loaded profile)
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.drag = None;
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }

    /// Swap the item at `idx` with the one above it. No-op at the top.
    pub fn move_up(&mut self, idx: usize) -> Option<Vec<T>> {
        if idx == 0 || idx >= self.items.len() {
            return None;
        }
        self.items.swap(idx - 1, idx);
        if self.selected == idx {
            self.selected = idx - 1;
        }
        Some(self.items.clone())
    }

    /// Swap the item at `idx` with the one below it. No-op at the bottom.
    pub fn move_down(&mut self, idx: usize) -> Option<Vec<T>> {
        if idx + 1 >= self.items.len() {
            return None;
        }
        self.items.swap(idx, idx + 1);
        if self.selected == idx {
            self.selected = idx + 1;
        }
        Some(self.items.clone())
    }

    /// Cursor movement; while dragging it moves the drop target instead
    pub fn select_prev(&mut self) {
        if self.is_empty() {
            return;
        }
        self.selected = self.selected.saturating_sub(1);
        self.drag_over(self.selected);
    }

    pub fn select_next(&mut self) {
        if self.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.len() - 1);
        self.drag_over(self.selected);
    }

    pub fn begin_drag(&mut self, idx: usize) {
        if idx < self.items.len() {
            self.drag = Some(DragState { from: idx, over: idx });
        }
    }

    pub fn drag_over(&mut self, idx: usize) {
        if let Some(drag) = self.drag.as_mut() {
            if idx < self.items.len() {
                drag.over = idx;
            }
        }
    }

    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.selected = drag.from;
        }
    }

    /// Finish a drag. Dropping onto the starting row changes nothing.
    pub fn drop_dragged(&mut self) -> Option<Vec<T>> {
        let drag = self.drag.take()?;
        let next = reorder(&self.items, drag.from, drag.over)?;
        self.items = next;
        self.selected = drag.over;
        Some(self.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> RankList<char> {
        RankList::new(vec!['a', 'b', 'c', 'd'])
    }

    #[test]
    fn test_reorder_moves_forward_and_back() {
        let items = ['a', 'b', 'c', 'd'];
        assert_eq!(reorder(&items, 0, 2), Some(vec!['b', 'c', 'a', 'd']));
        assert_eq!(reorder(&items, 3, 0), Some(vec!['d', 'a', 'b', 'c']));
        assert_eq!(reorder(&items, 1, 1), None);
        assert_eq!(reorder(&items, 5, 1), None);
    }

    #[test]
    fn test_move_up_then_down_restores_order() {
        for idx in 1..4 {
            let mut l = list();
            l.move_up(idx).unwrap();
            l.move_down(idx - 1).unwrap();
            assert_eq!(l.items(), &['a', 'b', 'c', 'd']);
        }
    }

    #[test]
    fn test_move_at_edges_is_noop() {
        let mut l = list();
        assert!(l.move_up(0).is_none());
        assert!(l.move_down(3).is_none());
        assert_eq!(l.items(), &['a', 'b', 'c', 'd']);
    }

    #[test]
    fn test_drop_on_self_is_noop() {
        let mut l = list();
        l.begin_drag(2);
        l.drag_over(2);
        assert!(l.drop_dragged().is_none());
        assert_eq!(l.items(), &['a', 'b', 'c', 'd']);
        assert!(l.drag().is_none());
    }

    #[test]
    fn test_keyboard_drag_moves_item() {
        let mut l = list();
        l.selected = 3;
        l.begin_drag(3);
        l.select_prev();
        l.select_prev();
        l.select_prev();
        let order = l.drop_dragged().unwrap();
        assert_eq!(order, vec!['d', 'a', 'b', 'c']);
        assert_eq!(l.selected, 0);
    }

    #[test]
    fn test_cancel_drag_restores_selection() {
        let mut l = list();
        l.selected = 1;
        l.begin_drag(1);
        l.select_next();
        l.cancel_drag();
        assert_eq!(l.selected, 1);
        assert_eq!(l.items(), &['a', 'b', 'c', 'd']);
    }

    #[test]
    fn test_selection_follows_moved_item() {
        let mut l = list();
        l.selected = 2;
        l.move_up(2);
        assert_eq!(l.selected, 1);
        assert_eq!(l.items()[l.selected], 'c');
    }
}
