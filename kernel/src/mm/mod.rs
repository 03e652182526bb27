//! Physical page allocation and Sv32 virtual memory mapping.

pub mod frame_allocator;
pub mod page_table;

pub use frame_allocator::alloc_pages;
pub use page_table::{map_page, PageTable, PAGE_R, PAGE_U, PAGE_V, PAGE_W, PAGE_X};
