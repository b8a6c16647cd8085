//! # Paged Array
//!
//! Columnar payload storage split into fixed-size pages.
//!
//! ```text
//! index:  0 .. 1023 | 1024 .. 2047 | 2048 .. 3071
//! pages: [ Some(..) ,    None      ,   Some(..)  ]
//! ```
//!
//! A page is allocated on the first write into its index range and is never
//! freed afterwards. Untouched ranges cost one `None` each, which keeps
//! sparse hole-packed sets cheap, and lets bulk copies skip them entirely.

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 1024;

/// One run of a [`PageSequence`]: a page and the prefix of it that is in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRun {
    /// Page number.
    pub page: usize,
    /// Number of used elements at the start of the page.
    pub len: usize,
    /// Dense index of the first element of the page.
    pub offset: usize,
}

/// Lazy sequence of [`PageRun`]s covering `[0, count)`.
#[derive(Clone, Debug)]
pub struct PageSequence {
    page_size: usize,
    count: usize,
    page: usize,
}

impl PageSequence {
    /// Creates the sequence for `count` elements split in pages of
    /// `page_size`.
    #[must_use]
    pub const fn new(page_size: usize, count: usize) -> Self {
        Self {
            page_size,
            count,
            page: 0,
        }
    }
}

impl Iterator for PageSequence {
    type Item = PageRun;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.page * self.page_size;
        if offset >= self.count {
            return None;
        }

        let run = PageRun {
            page: self.page,
            len: (self.count - offset).min(self.page_size),
            offset,
        };
        self.page += 1;
        Some(run)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.count.div_ceil(self.page_size);
        let left = total.saturating_sub(self.page);
        (left, Some(left))
    }
}

impl ExactSizeIterator for PageSequence {}

/// Page storage for payloads of one component kind.
///
/// # Example
///
/// ```rust
/// use rewind_core::PagedArray;
///
/// let mut data: PagedArray<u32> = PagedArray::new(4);
/// data.ensure_page_at(9);
///
/// assert!(data.has_page(2));
/// assert!(!data.has_page(0));
/// ```
#[derive(Clone, Debug)]
pub struct PagedArray<T> {
    pages: Vec<Option<Box<[T]>>>,
    page_size: usize,
    page_shift: u32,
}

impl<T: Default> PagedArray<T> {
    /// Creates an empty array.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is not a power of two.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        assert!(page_size.is_power_of_two(), "Page size must be a power of two");

        Self {
            pages: Vec::new(),
            page_size,
            page_shift: page_size.trailing_zeros(),
        }
    }

    /// Elements per page.
    #[inline]
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of page slots, allocated or not.
    #[inline]
    #[must_use]
    pub fn page_slots(&self) -> usize {
        self.pages.len()
    }

    /// Page number holding dense index `index`.
    #[inline]
    #[must_use]
    pub const fn page_of(&self, index: usize) -> usize {
        index >> self.page_shift
    }

    /// Checks whether a page is allocated, without allocating it.
    #[inline]
    #[must_use]
    pub fn has_page(&self, page: usize) -> bool {
        matches!(self.pages.get(page), Some(Some(_)))
    }

    /// Allocates a page if it is absent.
    pub fn ensure_page(&mut self, page: usize) {
        if page >= self.pages.len() {
            self.pages.resize_with(page + 1, || None);
        }
        if self.pages[page].is_none() {
            let fresh: Vec<T> = std::iter::repeat_with(T::default).take(self.page_size).collect();
            self.pages[page] = Some(fresh.into_boxed_slice());
        }
    }

    /// Allocates the page holding dense index `index` if it is absent.
    #[inline]
    pub fn ensure_page_at(&mut self, index: usize) {
        self.ensure_page(self.page_of(index));
    }

    /// All page slots.
    #[inline]
    #[must_use]
    pub fn pages(&self) -> &[Option<Box<[T]>>] {
        &self.pages
    }

    /// A page, if allocated.
    #[inline]
    #[must_use]
    pub fn page(&self, page: usize) -> Option<&[T]> {
        self.pages.get(page)?.as_deref()
    }

    /// A mutable page, if allocated.
    #[inline]
    pub fn page_mut(&mut self, page: usize) -> Option<&mut [T]> {
        self.pages.get_mut(page)?.as_deref_mut()
    }

    /// Element at dense index `index`, if its page is allocated.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.page(self.page_of(index))?.get(index & (self.page_size - 1))
    }

    /// Mutable element at dense index `index`, if its page is allocated.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let mask = self.page_size - 1;
        self.page_mut(self.page_of(index))?.get_mut(index & mask)
    }

    /// Mutable references to two distinct elements, in argument order.
    ///
    /// Returns `None` if the indices are equal or either page is absent.
    pub fn get_pair_mut(&mut self, first: usize, second: usize) -> Option<(&mut T, &mut T)> {
        if first == second {
            return None;
        }

        let mask = self.page_size - 1;
        let (first_page, second_page) = (self.page_of(first), self.page_of(second));
        let (first_slot, second_slot) = (first & mask, second & mask);

        if first_page == second_page {
            let page = self.page_mut(first_page)?;
            let (head, tail) = page.split_at_mut(first_slot.max(second_slot));
            return Some(if first_slot < second_slot {
                (&mut head[first_slot], &mut tail[0])
            } else {
                (&mut tail[0], &mut head[second_slot])
            });
        }

        let high = first_page.max(second_page);
        if high >= self.pages.len() {
            return None;
        }
        let (head, tail) = self.pages.split_at_mut(high);
        let low_page = head[first_page.min(second_page)].as_deref_mut()?;
        let high_page = tail[0].as_deref_mut()?;

        Some(if first_page < second_page {
            (&mut low_page[first_slot], &mut high_page[second_slot])
        } else {
            (&mut high_page[first_slot], &mut low_page[second_slot])
        })
    }

    /// Exchanges two elements. Does nothing if either page is absent.
    #[inline]
    pub fn swap(&mut self, first: usize, second: usize) {
        if let Some((first, second)) = self.get_pair_mut(first, second) {
            std::mem::swap(first, second);
        }
    }

    /// Page runs covering `[0, count)`.
    #[inline]
    #[must_use]
    pub const fn page_sequence(&self, count: usize) -> PageSequence {
        PageSequence::new(self.page_size, count)
    }
}
