#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Owner-scoped todo items for authenticated callers.
//!
//! Layout: `model` (items, patches, list queries), `store` (persistence
//! contract), `memory` (process-local store), `service` (validation and
//! timestamps over any store).

pub mod error;
pub mod memory;
pub mod model;
pub mod service;
pub mod store;

pub use error::{TodoError, TodoResult};
pub use memory::MemoryTodoStore;
pub use model::{
    DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT, NewTodo, SortOrder, Todo, TodoPage, TodoPatch,
    TodoQuery,
};
pub use service::TodoService;
pub use store::TodoStore;
