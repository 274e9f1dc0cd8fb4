//! delrpp-core: Deluge note conditions and their rendering to trigger events

pub mod condition;
mod error;
pub mod events;
pub mod expand;
pub mod linker;
mod note;
mod random;

pub use condition::{
    decode, decode_checked, encode, Condition, OneOfStack, SharedGroup, ALWAYS_VALUE,
};
pub use error::{DelrppError, Result};
pub use events::{to_trigger_events, TriggerEvent, TriggerKind};
pub use expand::{expand, needs_expansion, unroll, Expansion};
pub use linker::{link_conditions, LinkReport};
pub use note::{Note, PPQN};
pub use random::RandomSource;
