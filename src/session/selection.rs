use crate::geometry::tile_count;
use crate::models::geometry::Rectangle;

/// Rectangles drawn by the user, in draw order.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    rectangles: Vec<Rectangle>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rectangle: Rectangle) {
        self.rectangles.push(rectangle);
    }

    pub fn remove(&mut self, index: usize) -> Option<Rectangle> {
        if index < self.rectangles.len() {
            Some(self.rectangles.remove(index))
        } else {
            None
        }
    }

    /// Returns false if there is no rectangle at `index`.
    pub fn edit(&mut self, index: usize, rectangle: Rectangle) -> bool {
        match self.rectangles.get_mut(index) {
            Some(slot) => {
                *slot = rectangle;
                true
            }
            None => false,
        }
    }

    pub fn replace(&mut self, rectangles: Vec<Rectangle>) {
        self.rectangles = rectangles;
    }

    pub fn clear(&mut self) {
        self.rectangles.clear();
    }

    pub fn rectangles(&self) -> &[Rectangle] {
        &self.rectangles
    }

    pub fn len(&self) -> usize {
        self.rectangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }

    pub fn tile_count(&self, zoom: u32) -> u64 {
        tile_count(&self.rectangles, zoom)
    }
}

/// Tile number shown next to the selection. `value` is the local estimate
/// until the backend answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileCountDisplay {
    pub value: u64,
    pub pending: bool,
    pub over_limit: bool,
}
