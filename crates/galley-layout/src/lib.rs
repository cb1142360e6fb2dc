//! Galley's layout engine: the packers and the optimal line breaker.
//!
//! The input is a chain of shaped nodes (see `galley-node`); the output is
//! packed boxes. [`hpack`] and friends fold a chain into a single
//! horizontal box, computing natural size, per-order elasticity, a
//! glue-set ratio and a badness score. [`linebreak`] runs the optimal
//! breakpoint search over a paragraph chain and returns one packed line
//! per chosen break, stacked into a vertical list.

mod linebreak;
mod pack;

pub use self::linebreak::{
    linebreak, Breakpoint, BrokenParagraph, Fitness, LinebreakSettings,
};
pub use self::pack::{
    badness, hpack, hpack_to, hpack_to_with_end, vpack, AWFUL_BAD, INF_BAD,
};
