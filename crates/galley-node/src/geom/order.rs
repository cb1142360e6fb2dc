use std::fmt::{self, Debug, Formatter};
use std::ops::{Add, Sub};

use super::Sp;

/// An order of infinity for glue elasticity.
///
/// Higher orders dominate lower ones entirely: as soon as any glue of a
/// higher order is present in a list, the elasticity of all lower-order glue
/// becomes irrelevant. A single unit of `fil` outweighs any finite amount of
/// normal stretch.
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Order {
    /// Finite elasticity.
    #[default]
    Normal,
    /// First-order infinity.
    Fil,
    /// Second-order infinity.
    Fill,
    /// Third-order infinity.
    Filll,
}

impl Order {
    /// All orders, from weakest to strongest.
    pub const ALL: [Self; 4] = [Self::Normal, Self::Fil, Self::Fill, Self::Filll];

    /// The position of this order in per-order accumulation arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Normal => 0,
            Self::Fil => 1,
            Self::Fill => 2,
            Self::Filll => 3,
        }
    }

    /// Whether this order is an infinity.
    pub const fn is_infinite(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl Debug for Order {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(match self {
            Self::Normal => "",
            Self::Fil => "fil",
            Self::Fill => "fill",
            Self::Filll => "filll",
        })
    }
}

/// An amount of elasticity at some order of infinity.
///
/// Used for both the stretch and the shrink component of glue.
#[derive(Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Stretch {
    /// How much the glue can give way.
    pub amount: Sp,
    /// At which order of infinity.
    pub order: Order,
}

impl Stretch {
    /// No elasticity at all.
    pub const fn zero() -> Self {
        Self { amount: Sp::zero(), order: Order::Normal }
    }

    /// Finite elasticity.
    pub const fn finite(amount: Sp) -> Self {
        Self { amount, order: Order::Normal }
    }

    /// First-order infinite elasticity, measured in units of one point.
    pub fn fil(units: f64) -> Self {
        Self { amount: Sp::pt(units), order: Order::Fil }
    }

    /// Second-order infinite elasticity, measured in units of one point.
    pub fn fill(units: f64) -> Self {
        Self { amount: Sp::pt(units), order: Order::Fill }
    }
}

impl Debug for Stretch {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}{:?}", self.amount, self.order)
    }
}

/// Running totals of width and per-order elasticity over part of a chain.
///
/// The packers and the line breaker both fold node contributions into this;
/// subtracting the totals recorded at an earlier position yields the sums
/// for the span in between.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Totals {
    /// Accumulated natural width.
    pub width: Sp,
    /// Accumulated stretchability, indexed by [`Order::index`].
    pub stretch: [Sp; 4],
    /// Accumulated shrinkability, indexed by [`Order::index`].
    pub shrink: [Sp; 4],
}

impl Totals {
    /// Totals with everything at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stretch contribution at its own order.
    pub fn add_stretch(&mut self, stretch: Stretch) {
        self.stretch[stretch.order.index()] += stretch.amount;
    }

    /// Add a shrink contribution at its own order.
    pub fn add_shrink(&mut self, shrink: Stretch) {
        self.shrink[shrink.order.index()] += shrink.amount;
    }

    /// The effective stretchability: the total at the highest order that has
    /// any, together with that order. Lower orders are ignored once a higher
    /// one is present, since the orders are incommensurable.
    pub fn effective_stretch(&self) -> (Sp, Order) {
        Self::effective(&self.stretch)
    }

    /// The effective shrinkability, analogous to [`effective_stretch`].
    ///
    /// [`effective_stretch`]: Self::effective_stretch
    pub fn effective_shrink(&self) -> (Sp, Order) {
        Self::effective(&self.shrink)
    }

    fn effective(totals: &[Sp; 4]) -> (Sp, Order) {
        for order in Order::ALL.into_iter().rev() {
            let total = totals[order.index()];
            if total != Sp::zero() {
                return (total, order);
            }
        }
        (Sp::zero(), Order::Normal)
    }
}

impl Add for Totals {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let mut out = self;
        out.width += other.width;
        for i in 0..4 {
            out.stretch[i] += other.stretch[i];
            out.shrink[i] += other.shrink[i];
        }
        out
    }
}

impl Sub for Totals {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        let mut out = self;
        out.width -= other.width;
        for i in 0..4 {
            out.stretch[i] -= other.stretch[i];
            out.shrink[i] -= other.shrink[i];
        }
        out
    }
}

galley_utils::assign_impl!(Totals += Totals);
galley_utils::assign_impl!(Totals -= Totals);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_orders_dominate() {
        let mut totals = Totals::new();
        totals.add_stretch(Stretch::finite(Sp::pt(3.0)));
        assert_eq!(totals.effective_stretch(), (Sp::pt(3.0), Order::Normal));

        totals.add_stretch(Stretch::fil(1.0));
        assert_eq!(totals.effective_stretch(), (Sp::pt(1.0), Order::Fil));

        totals.add_stretch(Stretch::fill(2.0));
        assert_eq!(totals.effective_stretch(), (Sp::pt(2.0), Order::Fill));
    }

    #[test]
    fn test_span_subtraction() {
        let mut at_start = Totals::new();
        at_start.width = Sp::pt(10.0);
        at_start.add_shrink(Stretch::finite(Sp::pt(1.0)));

        let mut at_end = at_start;
        at_end.width += Sp::pt(25.0);
        at_end.add_shrink(Stretch::finite(Sp::pt(2.0)));

        let span = at_end - at_start;
        assert_eq!(span.width, Sp::pt(25.0));
        assert_eq!(span.effective_shrink(), (Sp::pt(2.0), Order::Normal));
    }
}
