use std::collections::HashMap;
use std::ops::Range;

use num_traits::Zero;

use crate::constants::PAGE_SIZE;
use crate::word::Word;

/// Sparse memory image for the IntCode VM.
/// Pages are allocated on first write; reads from a missing page yield zero.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    /// Allocated pages keyed by page number
    pages: HashMap<usize, Page>,

    /// One past the highest address ever written
    extent: usize,
}

/// A single page of memory
#[derive(Debug, Clone)]
struct Page {
    data: Vec<Word>,
}

impl Page {
    fn new() -> Self {
        Page {
            data: vec![Word::zero(); PAGE_SIZE],
        }
    }
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a memory image holding its own copy of `program` at `0..len`
    pub fn from_program<W: Clone + Into<Word>>(program: &[W]) -> Self {
        let mut memory = Self::new();
        for (chunk_idx, chunk) in program.chunks(PAGE_SIZE).enumerate() {
            let mut page = Page::new();
            for (slot, value) in page.data.iter_mut().zip(chunk) {
                *slot = value.clone().into();
            }
            memory.pages.insert(chunk_idx, page);
        }
        memory.extent = program.len();
        memory
    }

    pub fn read(&self, address: usize) -> Word {
        self.pages
            .get(&(address / PAGE_SIZE))
            .map(|page| page.data[address % PAGE_SIZE].clone())
            .unwrap_or_default()
    }

    pub fn write(&mut self, address: usize, value: Word) {
        let page_num = address / PAGE_SIZE;
        let end = address.saturating_add(1);
        if !self.pages.contains_key(&page_num) {
            if value.is_zero() {
                // Unallocated pages already read as zero
                self.extent = self.extent.max(end);
                return;
            }
            log::trace!("Memory: allocating page {:#x} for address {}", page_num, address);
        }

        let page = self.pages.entry(page_num).or_insert_with(Page::new);
        page.data[address % PAGE_SIZE] = value;
        self.extent = self.extent.max(end);
    }

    /// One past the highest address loaded or written
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// Number of pages currently backed by storage
    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }

    /// Copy out a range of addresses
    pub fn slice(&self, range: Range<usize>) -> Vec<Word> {
        range.map(|address| self.read(address)).collect()
    }

    /// Copy out `0..extent`
    pub fn snapshot(&self) -> Vec<Word> {
        self.slice(0..self.extent)
    }
}
