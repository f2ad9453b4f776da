use crate::error::{Result, SphinxQlError};

/// Read-only random access by index with bounds checking.
///
/// Assignment and removal exist only to fail: result collections are never
/// mutated through their indexed interface.
pub trait RandomAccess {
    type Item;

    fn contains_index(&mut self, index: usize) -> Result<bool>;

    fn get(&mut self, index: usize) -> Result<Self::Item>;

    fn len(&mut self) -> Result<usize>;

    fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn set(&mut self, index: usize, _value: Self::Item) -> Result<()> {
        Err(SphinxQlError::UnsupportedOperation(format!(
            "cannot assign index {} of a read-only result",
            index
        )))
    }

    fn remove(&mut self, index: usize) -> Result<()> {
        Err(SphinxQlError::UnsupportedOperation(format!(
            "cannot remove index {} of a read-only result",
            index
        )))
    }
}

/// Stateful forward traversal: `rewind`, then `is_valid` / `current` /
/// `advance` until `is_valid` reports false.
pub trait ForwardCursor {
    type Item;

    fn rewind(&mut self) -> Result<()>;

    fn is_valid(&mut self) -> Result<bool>;

    fn current(&mut self) -> Result<Self::Item>;

    fn key(&self) -> usize;

    fn advance(&mut self) -> Result<()>;
}

/// Std iterator over a [`ForwardCursor`], rewinding on the first pull.
/// An error is yielded once, then the iterator is exhausted.
pub struct CursorIter<'a, C: ForwardCursor + ?Sized> {
    cursor: &'a mut C,
    started: bool,
    done: bool,
}

impl<'a, C: ForwardCursor + ?Sized> CursorIter<'a, C> {
    pub fn new(cursor: &'a mut C) -> Self {
        Self {
            cursor,
            started: false,
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<C::Item>> {
        if self.started {
            self.cursor.advance()?;
        } else {
            self.cursor.rewind()?;
            self.started = true;
        }
        if !self.cursor.is_valid()? {
            return Ok(None);
        }
        self.cursor.current().map(Some)
    }
}

impl<C: ForwardCursor + ?Sized> Iterator for CursorIter<'_, C> {
    type Item = Result<C::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
