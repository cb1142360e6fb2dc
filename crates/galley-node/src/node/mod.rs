//! The box-and-glue vocabulary of typesetting.

mod attr;
mod list;

pub use self::attr::{Attr, Attrs};
pub use self::list::{Chain, NodeList, NodeRef, Nodes};

use ecow::EcoString;

use crate::geom::{Axis, Sp, Stretch};

/// A penalty at least this large forbids a break.
pub const INF_PENALTY: i32 = 10_000;

/// A penalty at most this large forces a break.
pub const EJECT_PENALTY: i32 = -10_000;

/// A typesetting node.
///
/// The variant set is closed: the packers and the line breaker match on it
/// exhaustively, so adding a variant surfaces every site that needs to
/// handle it at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A shaped glyph with precomputed metrics.
    Glyph(Glyph),
    /// Elastic blank space.
    Glue(Glue),
    /// A judgment about the desirability of breaking here.
    Penalty(Penalty),
    /// A discretionary break, e.g. a hyphenation point.
    Disc(Disc),
    /// A fixed displacement.
    Kern(Kern),
    /// A solid rectangle.
    Rule(Rule),
    /// An external image, sized by its producer.
    Image(Image),
    /// A language-change marker.
    Lang(Lang),
    /// A start or stop marker delimiting a span of cross-cutting metadata.
    StartStop(StartStop),
    /// A packed horizontal list.
    HList(HBox),
    /// A packed vertical list.
    VList(VBox),
}

/// A shaped glyph.
///
/// Shaping, measurement and hyphenation-point discovery all happen upstream;
/// the glyph arrives here carrying everything the breaker needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// The advance width.
    pub width: Sp,
    /// The extent above the baseline.
    pub height: Sp,
    /// The extent below the baseline.
    pub depth: Sp,
    /// The codepoint this glyph renders.
    pub codepoint: char,
    /// An opaque font reference.
    pub font: usize,
    /// Whether the glyph may participate in hyphenation.
    pub hyphenate: bool,
    /// A kerning adjustment applied after this glyph.
    pub kern: Sp,
}

impl Glyph {
    /// Create a glyph with the given metrics and no kerning.
    pub fn new(codepoint: char, width: Sp, height: Sp, depth: Sp) -> Self {
        Self {
            width,
            height,
            depth,
            codepoint,
            font: 0,
            hyphenate: false,
            kern: Sp::zero(),
        }
    }

    /// The full advance of the glyph, including the trailing kern.
    pub fn advance(&self) -> Sp {
        self.width + self.kern
    }
}

/// Elastic blank space.
#[derive(Debug, Clone, PartialEq)]
pub struct Glue {
    /// The natural width.
    pub width: Sp,
    /// How much the glue can widen beyond its natural width.
    pub stretch: Stretch,
    /// How much the glue can narrow below its natural width.
    pub shrink: Stretch,
}

impl Glue {
    /// Space with a fixed width.
    pub const fn fixed(width: Sp) -> Self {
        Self { width, stretch: Stretch::zero(), shrink: Stretch::zero() }
    }

    /// Space with finite stretch and shrink capacity.
    pub const fn elastic(width: Sp, stretch: Sp, shrink: Sp) -> Self {
        Self {
            width,
            stretch: Stretch::finite(stretch),
            shrink: Stretch::finite(shrink),
        }
    }

    /// Zero-width space that can stretch without limit.
    pub fn fil() -> Self {
        Self {
            width: Sp::zero(),
            stretch: Stretch::fil(1.0),
            shrink: Stretch::zero(),
        }
    }
}

/// A judgment about the desirability of breaking at this position.
#[derive(Debug, Clone, PartialEq)]
pub struct Penalty {
    /// The cost of breaking here. At or above [`INF_PENALTY`] the break is
    /// forbidden; at or below [`EJECT_PENALTY`] it is forced; in between it
    /// biases the breaker's demerits.
    pub penalty: i32,
    /// Width contributed to the line only if the break is taken here.
    pub width: Sp,
    /// Marks penalties whose breaks should not occur on two lines in a row,
    /// e.g. hyphenation points.
    pub flagged: bool,
}

impl Penalty {
    /// A plain penalty with no width and no flag.
    pub const fn new(penalty: i32) -> Self {
        Self { penalty, width: Sp::zero(), flagged: false }
    }

    /// A penalty that forbids a break.
    pub const fn prohibit() -> Self {
        Self::new(INF_PENALTY)
    }

    /// A penalty that forces a break.
    pub const fn force() -> Self {
        Self::new(EJECT_PENALTY)
    }
}

/// A discretionary break.
///
/// If the breaker chooses this position, the `pre` chain (typically a
/// hyphen glyph) is spliced onto the end of the line; otherwise the node
/// contributes nothing at all. A disc is transparent to break-legality
/// bookkeeping: a glue directly following it remains a legal breakpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Disc {
    /// Material inserted before the break, only if the break is taken.
    pub pre: Option<NodeRef>,
}

/// A fixed displacement along the traversal axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Kern {
    /// The displacement. May be negative.
    pub amount: Sp,
}

/// A solid rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// The width of the rule.
    pub width: Sp,
    /// The extent above the baseline.
    pub height: Sp,
    /// The extent below the baseline.
    pub depth: Sp,
}

/// An external image. The core only needs its box dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// The display width.
    pub width: Sp,
    /// The display height.
    pub height: Sp,
}

/// A language-change marker, delimiting hyphenation regimes upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Lang {
    /// A BCP 47 language tag.
    pub lang: EcoString,
}

/// A marker opening or closing a span of cross-cutting metadata.
///
/// The payload lives in the node's attributes; the core carries the marker
/// through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct StartStop {
    /// Whether this marker opens (`true`) or closes (`false`) a span.
    pub start: bool,
}

/// A packed horizontal list: one finished line, or any other row of
/// material folded into a single box.
#[derive(Debug, Clone, PartialEq)]
pub struct HBox {
    /// The width of the box.
    pub width: Sp,
    /// The extent above the baseline.
    pub height: Sp,
    /// The extent below the baseline.
    pub depth: Sp,
    /// How far the contained glue was stretched (positive) or shrunk
    /// (negative), as a ratio of the available capacity. Not necessarily in
    /// [-1, 1].
    pub glue_set: f64,
    /// How badly the box deviates from its natural width.
    pub badness: u32,
    /// The child chain.
    pub head: Option<NodeRef>,
}

/// A packed vertical list, e.g. a finished paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct VBox {
    /// The width of the box.
    pub width: Sp,
    /// The extent above the baseline.
    pub height: Sp,
    /// The extent below the baseline.
    pub depth: Sp,
    /// How far the contained glue was stretched or shrunk.
    pub glue_set: f64,
    /// How badly the box deviates from its natural size.
    pub badness: u32,
    /// The child chain.
    pub head: Option<NodeRef>,
}

impl Node {
    /// Whether this node is box-like: definitely sized material that can
    /// end a line before a glue breakpoint.
    pub fn is_box(&self) -> bool {
        matches!(
            self,
            Self::Glyph(_)
                | Self::Rule(_)
                | Self::Image(_)
                | Self::HList(_)
                | Self::VList(_)
        )
    }

    /// Whether this node vanishes when it directly follows a chosen break.
    pub fn is_discardable(&self) -> bool {
        match self {
            Self::Glue(_) | Self::Kern(_) => true,
            Self::Penalty(penalty) => penalty.penalty > EJECT_PENALTY,
            _ => false,
        }
    }

    /// Whether this node is invisible to break-legality bookkeeping.
    ///
    /// Transparent nodes neither set nor clear the "a box precedes" state,
    /// so e.g. a glue after a disc or after a metadata marker remains a
    /// legal breakpoint.
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Disc(_) | Self::Lang(_) | Self::StartStop(_))
    }

    /// This node's contribution to the size of a list traversed along
    /// `axis`.
    ///
    /// Glue and kerns contribute along the traversal axis only; box-like
    /// nodes contribute their width horizontally and their full vertical
    /// extent vertically. Penalties and discs contribute nothing unless a
    /// break is taken at them, which is accounted for separately.
    pub fn advance(&self, axis: Axis) -> Sp {
        match (self, axis) {
            (Self::Glyph(glyph), Axis::Horizontal) => glyph.advance(),
            (Self::Glyph(glyph), Axis::Vertical) => glyph.height + glyph.depth,
            (Self::Glue(glue), _) => glue.width,
            (Self::Kern(kern), _) => kern.amount,
            (Self::Rule(rule), Axis::Horizontal) => rule.width,
            (Self::Rule(rule), Axis::Vertical) => rule.height + rule.depth,
            (Self::Image(image), Axis::Horizontal) => image.width,
            (Self::Image(image), Axis::Vertical) => image.height,
            (Self::HList(hbox), Axis::Horizontal) => hbox.width,
            (Self::HList(hbox), Axis::Vertical) => hbox.height + hbox.depth,
            (Self::VList(vbox), Axis::Horizontal) => vbox.width,
            (Self::VList(vbox), Axis::Vertical) => vbox.height + vbox.depth,
            (Self::Penalty(_) | Self::Disc(_), _) => Sp::zero(),
            (Self::Lang(_) | Self::StartStop(_), _) => Sp::zero(),
        }
    }

    /// This node's extent across the traversal axis: (height, depth) when
    /// traversing horizontally, (width, zero) when traversing vertically.
    pub fn extent(&self, axis: Axis) -> (Sp, Sp) {
        match (self, axis) {
            (Self::Glyph(glyph), Axis::Horizontal) => (glyph.height, glyph.depth),
            (Self::Rule(rule), Axis::Horizontal) => (rule.height, rule.depth),
            (Self::Image(image), Axis::Horizontal) => (image.height, Sp::zero()),
            (Self::HList(hbox), Axis::Horizontal) => (hbox.height, hbox.depth),
            (Self::VList(vbox), Axis::Horizontal) => (vbox.height, vbox.depth),
            (Self::Glyph(glyph), Axis::Vertical) => (glyph.width, Sp::zero()),
            (Self::Rule(rule), Axis::Vertical) => (rule.width, Sp::zero()),
            (Self::Image(image), Axis::Vertical) => (image.width, Sp::zero()),
            (Self::HList(hbox), Axis::Vertical) => (hbox.width, Sp::zero()),
            (Self::VList(vbox), Axis::Vertical) => (vbox.width, Sp::zero()),
            (
                Self::Glue(_)
                | Self::Kern(_)
                | Self::Penalty(_)
                | Self::Disc(_)
                | Self::Lang(_)
                | Self::StartStop(_),
                _,
            ) => (Sp::zero(), Sp::zero()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glue_contributes_along_axis_only() {
        let glue = Node::Glue(Glue::fixed(Sp::pt(3.0)));
        assert_eq!(glue.advance(Axis::Horizontal), Sp::pt(3.0));
        assert_eq!(glue.extent(Axis::Horizontal), (Sp::zero(), Sp::zero()));
    }

    #[test]
    fn test_glyph_advance_includes_kern() {
        let mut glyph = Glyph::new('f', Sp::pt(5.0), Sp::pt(7.0), Sp::pt(2.0));
        glyph.kern = Sp::pt(-0.25);
        let node = Node::Glyph(glyph);
        assert_eq!(node.advance(Axis::Horizontal), Sp::pt(4.75));
        assert_eq!(node.extent(Axis::Horizontal), (Sp::pt(7.0), Sp::pt(2.0)));
        assert_eq!(node.advance(Axis::Vertical), Sp::pt(9.0));
    }
}
