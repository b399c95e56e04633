pub mod intrusive_list;
pub mod slot_arena;
pub mod unused_queue;

pub use intrusive_list::IntrusiveList;
pub use slot_arena::{SlotArena, SlotId};
pub use unused_queue::UnusedQueue;
