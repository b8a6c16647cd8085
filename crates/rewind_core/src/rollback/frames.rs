//! # Frames
//!
//! Captured state of sparse sets and data sets.
//!
//! A set frame copies the bookkeeping, `packed[..count]` and the whole lookup
//! array. A data frame adds a copy of every payload page that was allocated
//! inside `[0, count)` at capture time. Pages that were never allocated
//! could not hold live payloads, so restore leaves them alone.

use super::history::Snapshot;
use crate::ecs::{DataSet, SetState, SparseSet, INVALID_INDEX};

/// Saved state of a [`SparseSet`].
#[derive(Clone, Debug, Default)]
pub struct SetFrame {
    state: SetState,
    packed: Vec<i32>,
    sparse: Vec<i32>,
}

impl SetFrame {
    /// Bookkeeping at capture time.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SetState {
        self.state
    }

    /// Copies the state of `set` into this frame, reusing its buffers.
    pub fn capture_from(&mut self, set: &SparseSet) {
        let state = set.state();
        self.state = state;
        self.packed.clear();
        self.packed.extend_from_slice(&set.packed()[..state.count]);
        self.sparse.clear();
        self.sparse.extend_from_slice(set.sparse());
    }

    /// Overwrites `set` with this frame.
    pub fn restore_into(&self, set: &mut SparseSet) {
        let count = self.state.count;
        if count > 0 {
            set.ensure_packed_at(count - 1);
        }
        set.packed_mut()[..count].copy_from_slice(&self.packed);

        let saved = self.sparse.len();
        if set.sparse().len() < saved {
            set.resize_sparse(saved);
        }
        let sparse = set.sparse_mut();
        sparse[..saved].copy_from_slice(&self.sparse);
        sparse[saved..].fill(INVALID_INDEX);

        set.set_state(self.state);
    }
}

impl Snapshot for SparseSet {
    type Frame = SetFrame;

    #[inline]
    fn capture(&self, frame: &mut SetFrame) {
        frame.capture_from(self);
    }

    #[inline]
    fn restore(&mut self, frame: &SetFrame) {
        frame.restore_into(self);
    }
}

#[derive(Debug)]
struct PageCopy<T> {
    buffer: Option<Box<[T]>>,
    recorded: bool,
}

impl<T> Default for PageCopy<T> {
    fn default() -> Self {
        Self {
            buffer: None,
            recorded: false,
        }
    }
}

/// Saved state of a [`DataSet`].
#[derive(Debug)]
pub struct DataFrame<T> {
    set: SetFrame,
    pages: Vec<PageCopy<T>>,
}

impl<T> Default for DataFrame<T> {
    fn default() -> Self {
        Self {
            set: SetFrame::default(),
            pages: Vec::new(),
        }
    }
}

impl<T> DataFrame<T> {
    /// Bookkeeping at capture time.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SetState {
        self.set.state()
    }

    /// Number of payload pages held by this frame.
    #[must_use]
    pub fn recorded_pages(&self) -> usize {
        self.pages.iter().filter(|page| page.recorded).count()
    }
}

impl<T: Default + 'static> Snapshot for DataSet<T> {
    type Frame = DataFrame<T>;

    fn capture(&self, frame: &mut DataFrame<T>) {
        let (set, payload) = self.parts();
        frame.set.capture_from(set);

        for page in &mut frame.pages {
            page.recorded = false;
        }

        for run in payload.data.page_sequence(set.count()) {
            let Some(source) = payload.data.page(run.page) else {
                continue;
            };

            if frame.pages.len() <= run.page {
                frame.pages.resize_with(run.page + 1, PageCopy::default);
            }
            let copy = &mut frame.pages[run.page];
            let buffer = copy.buffer.get_or_insert_with(|| {
                let fresh: Vec<T> = std::iter::repeat_with(T::default).take(source.len()).collect();
                fresh.into_boxed_slice()
            });
            payload.copier.copy_run(&source[..run.len], &mut buffer[..run.len]);
            copy.recorded = true;
        }
    }

    fn restore(&mut self, frame: &DataFrame<T>) {
        let count = frame.state().count;
        let (set, payload) = self.parts_mut();
        frame.set.restore_into(set);

        for run in payload.data.page_sequence(count) {
            let Some(PageCopy {
                buffer: Some(buffer),
                recorded: true,
            }) = frame.pages.get(run.page)
            else {
                continue;
            };

            payload.data.ensure_page(run.page);
            if let Some(live) = payload.data.page_mut(run.page) {
                payload.copier.copy_run(&buffer[..run.len], &mut live[..run.len]);
            }
        }
    }
}
