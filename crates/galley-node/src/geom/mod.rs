//! Fixed-point geometry for typesetting.

mod axis;
mod order;
mod sp;

pub use self::axis::Axis;
pub use self::order::{Order, Stretch, Totals};
pub use self::sp::Sp;
