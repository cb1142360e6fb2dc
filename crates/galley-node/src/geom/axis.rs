use std::fmt::{self, Debug, Formatter};

/// The two axes along which a node chain can be traversed.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum Axis {
    /// The horizontal axis, along which lines run.
    Horizontal,
    /// The vertical axis, along which lines stack.
    Vertical,
}

impl Axis {
    /// The other axis.
    pub const fn other(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

impl Debug for Axis {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        })
    }
}
