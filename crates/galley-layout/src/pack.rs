//! Folding node chains into boxes.

use galley_node::geom::{Axis, Order, Sp, Totals};
use galley_node::node::{Attr, HBox, Node, NodeList, NodeRef, VBox};

/// The badness of a box whose shrink capacity is exceeded.
///
/// This saturates: a line that is overfull by a hair and one that is
/// overfull by a mile report the same value, so callers can detect the
/// condition without the number growing without bound.
pub const AWFUL_BAD: u32 = 1_000_000;

/// The largest badness of a box that stays within its glue's capacity.
pub const INF_BAD: u32 = 10_000;

/// The classic cubic badness of an adjustment ratio.
///
/// Grows with the cube of the ratio, scaled by 100 and capped at
/// [`INF_BAD`]; a ratio below -1 saturates to [`AWFUL_BAD`].
pub fn badness(ratio: f64) -> u32 {
    if ratio < -1.0 {
        AWFUL_BAD
    } else if !ratio.is_finite() {
        INF_BAD
    } else {
        let scaled = 100.0 * ratio.abs().powi(3);
        if scaled >= INF_BAD as f64 {
            INF_BAD
        } else {
            scaled.round() as u32
        }
    }
}

/// Pack a chain into a horizontal box at its natural width.
///
/// Widths sum up in traversal order; height and depth are the maxima over
/// the box-like nodes. Glue elasticity is ignored entirely. This cannot
/// fail.
pub fn hpack(list: &mut NodeList, head: Option<NodeRef>) -> NodeRef {
    let measured = measure(list, head, None);
    list.add(Node::HList(HBox {
        width: measured.totals.width,
        height: measured.height,
        depth: measured.depth,
        glue_set: 0.0,
        badness: 0,
        head,
    }))
}

/// Pack a chain into a horizontal box of the given width, stretching or
/// shrinking its glue to fit.
pub fn hpack_to(list: &mut NodeList, head: Option<NodeRef>, target: Sp) -> NodeRef {
    hpack_span(list, head, None, target, None)
}

/// Like [`hpack_to`], but stops after the node `end` instead of at the end
/// of the chain.
pub fn hpack_to_with_end(
    list: &mut NodeList,
    head: Option<NodeRef>,
    end: NodeRef,
    target: Sp,
) -> NodeRef {
    hpack_span(list, head, Some(end), target, None)
}

/// The shared worker behind the `hpack_to` family.
///
/// When `expansion` is set and the span cannot shrink far enough, the
/// shrink is clamped at capacity and the leftover is recorded as a glyph
/// expansion factor instead of an overfull box.
pub(crate) fn hpack_span(
    list: &mut NodeList,
    head: Option<NodeRef>,
    end: Option<NodeRef>,
    target: Sp,
    expansion: Option<f64>,
) -> NodeRef {
    let measured = measure(list, head, end);
    let natural = measured.totals.width;
    let delta = target - natural;

    // An exact fit reports a ratio of one by convention.
    let mut glue_set = 1.0;
    let mut bad = 0;
    let mut expand = None;

    if delta > Sp::zero() {
        let (capacity, order) = measured.totals.effective_stretch();
        if capacity == Sp::zero() {
            glue_set = f64::INFINITY;
            bad = INF_BAD;
        } else {
            let ratio = delta / capacity;
            glue_set = ratio;
            bad = if order.is_infinite() { 0 } else { badness(ratio) };
            set_glue(list, head, end, ratio, order);
        }
    } else if delta < Sp::zero() {
        let (capacity, order) = measured.totals.effective_shrink();
        if capacity == Sp::zero() {
            glue_set = f64::NEG_INFINITY;
            bad = AWFUL_BAD;
        } else {
            let ratio = delta / capacity;
            glue_set = ratio;
            bad = if order.is_infinite() { 0 } else { badness(ratio) };
            set_glue(list, head, end, ratio.max(-1.0), order);
        }

        if bad == AWFUL_BAD {
            if let Some(allowance) = expansion {
                // Shrink to capacity and let the renderer squeeze the
                // glyphs for the rest.
                let excess = -delta - measured.totals.effective_shrink().0;
                let factor = if measured.glyphs == Sp::zero() {
                    allowance
                } else {
                    (excess / measured.glyphs).min(allowance)
                };
                glue_set = -1.0;
                bad = badness(-1.0);
                expand = Some(factor);
            }
        }
    }

    let hbox = list.add(Node::HList(HBox {
        width: target,
        height: measured.height,
        depth: measured.depth,
        glue_set,
        badness: bad,
        head,
    }));
    if let Some(factor) = expand {
        list.set_attr(hbox, "expansion", Attr::Float(factor));
    }
    hbox
}

/// Pack a chain into a vertical box at its natural size.
///
/// Heights and depths sum up along the chain, except that the trailing
/// box's depth hangs below the baseline of the whole list and becomes the
/// box's own depth.
pub fn vpack(list: &mut NodeList, head: Option<NodeRef>) -> NodeRef {
    let mut width = Sp::zero();
    let mut height = Sp::zero();
    for r in list.iter(head) {
        let node = &list[r];
        height += node.advance(Axis::Vertical);
        let (w, _) = node.extent(Axis::Vertical);
        width.set_max(w);
    }

    let mut depth = Sp::zero();
    if let Some(tail) = list.tail(head) {
        let (_, d) = list[tail].extent(Axis::Horizontal);
        height -= d;
        depth = d;
    }

    list.add(Node::VList(VBox {
        width,
        height,
        depth,
        glue_set: 0.0,
        badness: 0,
        head,
    }))
}

/// The natural width of a chain.
pub(crate) fn natural_width(list: &NodeList, head: Option<NodeRef>) -> Sp {
    measure(list, head, None).totals.width
}

struct Measured {
    totals: Totals,
    height: Sp,
    depth: Sp,
    glyphs: Sp,
}

/// Accumulate the horizontal totals and vertical extents of a span.
fn measure(list: &NodeList, head: Option<NodeRef>, end: Option<NodeRef>) -> Measured {
    let mut measured = Measured {
        totals: Totals::new(),
        height: Sp::zero(),
        depth: Sp::zero(),
        glyphs: Sp::zero(),
    };
    for r in list.iter(head) {
        let node = &list[r];
        measured.totals.width += node.advance(Axis::Horizontal);
        match node {
            Node::Glue(glue) => {
                measured.totals.add_stretch(glue.stretch);
                measured.totals.add_shrink(glue.shrink);
            }
            Node::Glyph(glyph) => measured.glyphs += glyph.width,
            _ => {}
        }
        let (h, d) = node.extent(Axis::Horizontal);
        measured.height.set_max(h);
        measured.depth.set_max(d);
        if Some(r) == end {
            break;
        }
    }
    measured
}

/// Physically adjust the width of every glue in the span whose own order
/// matches the effective one. Glue at lower orders keeps its natural width
/// once a higher order is in play.
fn set_glue(
    list: &mut NodeList,
    head: Option<NodeRef>,
    end: Option<NodeRef>,
    ratio: f64,
    order: Order,
) {
    let mut cur = head;
    while let Some(r) = cur {
        if let Node::Glue(glue) = &mut list[r] {
            if ratio >= 0.0 {
                if glue.stretch.order == order {
                    glue.width += glue.stretch.amount * ratio;
                }
            } else if glue.shrink.order == order {
                glue.width += glue.shrink.amount * ratio;
            }
        }
        if Some(r) == end {
            break;
        }
        cur = list.next(r);
    }
}
