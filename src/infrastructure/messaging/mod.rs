pub mod in_memory;
pub mod jetstream;
pub mod telegram;
