//! Breaking paragraphs into lines.
//!
//! The breaker walks the node chain once, maintaining a list of still
//! reachable breakpoint candidates and, per candidate position, the best
//! known chain of breaks leading there, per fitness class. This is the
//! classic optimal-fit search: instead of greedily filling each line, it
//! minimizes the accumulated demerits of the whole paragraph, so a
//! slightly short line early on can buy a much better fit further down.

use galley_node::diag::{bail, StrResult};
use galley_node::geom::{Axis, Sp, Totals};
use galley_node::node::{
    Chain, Kern, Node, NodeList, NodeRef, VBox, EJECT_PENALTY, INF_PENALTY,
};

use crate::pack::{badness, hpack_span, natural_width, AWFUL_BAD, INF_BAD};

/// Settings for breaking a paragraph into lines.
///
/// Immutable during an invocation of [`linebreak`]; the breaker only ever
/// reads it.
#[derive(Debug, Clone)]
pub struct LinebreakSettings {
    /// The target line width. Must be positive.
    pub hsize: Sp,
    /// The largest adjustment ratio acceptable for a line. The default of
    /// infinity accepts any line its glue can reach.
    pub tolerance: f64,
    /// The fixed vertical advance from one line to the next.
    pub line_height: Sp,
    /// The penalty for breaking at a discretionary.
    pub hyphen_penalty: i32,
    /// Extra demerits when two consecutive lines end in flagged breaks,
    /// e.g. two hyphenations in a row.
    pub double_hyphen_demerits: i64,
    /// Extra demerits when the fitness of adjacent lines jumps by more
    /// than one class.
    pub fitness_demerits: i64,
    /// The largest glyph expansion factor the renderer may apply instead
    /// of an overfull line being reported. Off by default.
    pub font_expansion: Option<f64>,
    /// Indentation applied to the first [`indent_rows`](Self::indent_rows)
    /// lines.
    pub indent: Sp,
    /// How many lines the indentation applies to.
    pub indent_rows: usize,
    /// A chain copied to the start of every line.
    pub line_start_glue: Option<NodeRef>,
    /// A chain copied to the end of every line.
    pub line_end_glue: Option<NodeRef>,
    /// Let the last line contribute its natural height to the paragraph
    /// instead of the fixed line height.
    pub omit_last_leading: bool,
    /// Let trailing punctuation hang into the right margin.
    pub hanging_punctuation_end: bool,
}

impl Default for LinebreakSettings {
    fn default() -> Self {
        Self {
            hsize: Sp::zero(),
            tolerance: f64::INFINITY,
            line_height: Sp::pt(12.0),
            hyphen_penalty: 50,
            double_hyphen_demerits: 3000,
            fitness_demerits: 100,
            font_expansion: None,
            indent: Sp::zero(),
            indent_rows: 0,
            line_start_glue: None,
            line_end_glue: None,
            omit_last_leading: false,
            hanging_punctuation_end: false,
        }
    }
}

impl LinebreakSettings {
    /// Check that the settings describe a breakable layout.
    pub fn validate(&self) -> StrResult<()> {
        if self.hsize <= Sp::zero() {
            bail!("line width must be positive, is {:?}", self.hsize);
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            bail!("tolerance must be a non-negative number");
        }
        if self.line_height < Sp::zero() {
            bail!("line height must not be negative, is {:?}", self.line_height);
        }
        if let Some(factor) = self.font_expansion {
            if !(0.0..=1.0).contains(&factor) {
                bail!("font expansion must lie within 0..=1, is {factor}");
            }
        }
        Ok(())
    }
}

/// How tightly a line is set, derived from its adjustment ratio.
///
/// Adjacent lines whose classes differ by more than one step look jarring
/// and are surcharged.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Fitness {
    /// Noticeably shrunk: ratio below -0.5.
    Tight,
    /// Close to natural: ratio up to 0.5.
    Decent,
    /// Noticeably stretched: ratio up to 1.
    Loose,
    /// Stretched beyond its capacity's sweet spot: ratio above 1.
    VeryLoose,
}

impl Fitness {
    /// All classes, from tightest to loosest.
    pub const ALL: [Self; 4] = [Self::Tight, Self::Decent, Self::Loose, Self::VeryLoose];

    /// Classify an adjustment ratio.
    pub fn of(ratio: f64) -> Self {
        if ratio < -0.5 {
            Self::Tight
        } else if ratio <= 0.5 {
            Self::Decent
        } else if ratio <= 1.0 {
            Self::Loose
        } else {
            Self::VeryLoose
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Tight => 0,
            Self::Decent => 1,
            Self::Loose => 2,
            Self::VeryLoose => 3,
        }
    }

    /// How many classes apart two fitnesses are.
    pub fn distance(self, other: Self) -> usize {
        self.index().abs_diff(other.index())
    }
}

/// A breakpoint: a feasible place to end a line, together with the best
/// known chain of breaks leading to it.
///
/// During the search these form the active list; afterwards the chosen
/// ones are returned in order, one per line, for diagnostics and per-line
/// post-processing.
#[derive(Debug, Clone)]
pub struct Breakpoint {
    /// The node broken at. `None` marks the start of the paragraph.
    pub pos: Option<NodeRef>,
    /// How many lines precede this break.
    pub line: usize,
    /// The fitness of the line ending here.
    pub fitness: Fitness,
    /// The total demerits of the best chain of breaks ending here.
    pub demerits: i64,
    /// The adjustment ratio of the line ending here.
    pub ratio: f64,
    flagged: bool,
    hang: Sp,
    totals: Totals,
    from: usize,
    next: Option<usize>,
}

/// A paragraph broken into lines.
#[derive(Debug)]
pub struct BrokenParagraph {
    /// A vertical list whose children are the packed lines, each of the
    /// configured width.
    pub vlist: NodeRef,
    /// The chosen breakpoints, in order, one per line.
    pub breakpoints: Vec<Breakpoint>,
}

/// Break a paragraph into justified lines.
///
/// Consumes the chain at `head`: its nodes end up relinked into the
/// per-line boxes of the returned vertical list. The chain should end in
/// the canonical terminator (see
/// [`append_paragraph_end`](NodeList::append_paragraph_end)); a chain
/// without one is finished with a forced break at its very end.
///
/// Overfull and underfull lines are not errors: they come back as lines
/// with saturated badness for the caller to inspect.
pub fn linebreak(
    list: &mut NodeList,
    head: Option<NodeRef>,
    settings: &LinebreakSettings,
) -> StrResult<BrokenParagraph> {
    settings.validate()?;

    let mut breaker = Breaker::new(list, settings);
    breaker.scan(list, head);
    let chosen = breaker.retrace();
    Ok(breaker.assemble(list, head, &chosen))
}

/// A candidate for the per-class minima at one legal position.
#[derive(Copy, Clone)]
struct Candidate {
    demerits: i64,
    from: usize,
    ratio: f64,
}

/// The state of the breakpoint search.
struct Breaker<'a> {
    settings: &'a LinebreakSettings,
    /// Contributions every line receives from the start and end templates.
    background: Totals,
    /// All breakpoints ever created; pruned ones simply drop out of the
    /// active chain but keep their records for retracing.
    nodes: Vec<Breakpoint>,
    /// Head of the active list, threaded through [`Breakpoint::next`].
    active: Option<usize>,
    /// Running totals over the consumed part of the chain.
    totals: Totals,
}

impl<'a> Breaker<'a> {
    fn new(list: &NodeList, settings: &'a LinebreakSettings) -> Self {
        let mut background = Totals::new();
        for template in [settings.line_start_glue, settings.line_end_glue] {
            for r in list.iter(template) {
                let node = &list[r];
                background.width += node.advance(Axis::Horizontal);
                if let Node::Glue(glue) = node {
                    background.add_stretch(glue.stretch);
                    background.add_shrink(glue.shrink);
                }
            }
        }

        let root = Breakpoint {
            pos: None,
            line: 0,
            fitness: Fitness::Decent,
            demerits: 0,
            ratio: 0.0,
            flagged: false,
            hang: Sp::zero(),
            totals: Totals::new(),
            from: 0,
            next: None,
        };

        Self {
            settings,
            background,
            nodes: vec![root],
            active: Some(0),
            totals: Totals::new(),
        }
    }

    /// Walk the chain once, evaluating every legal break position against
    /// the active list.
    fn scan(&mut self, list: &NodeList, head: Option<NodeRef>) {
        let mut prev_is_box = false;
        let mut last = None;
        let mut cur = head;

        while let Some(r) = cur {
            match &list[r] {
                Node::Glue(glue) => {
                    // A glue is a legal break only after box-like material;
                    // the line ends before the glue, so evaluate before
                    // consuming it.
                    if prev_is_box {
                        let hang = self.hang_before(list, r);
                        self.try_break(list, Some(r), 0, false, Sp::zero(), hang);
                    }
                    self.totals.width += glue.width;
                    self.totals.add_stretch(glue.stretch);
                    self.totals.add_shrink(glue.shrink);
                    prev_is_box = false;
                }
                Node::Penalty(penalty) => {
                    if penalty.penalty < INF_PENALTY {
                        let hang = if penalty.width == Sp::zero() {
                            self.hang_before(list, r)
                        } else {
                            Sp::zero()
                        };
                        self.try_break(
                            list,
                            Some(r),
                            penalty.penalty,
                            penalty.flagged,
                            penalty.width,
                            hang,
                        );
                    }
                    prev_is_box = false;
                }
                Node::Disc(disc) => {
                    // A discretionary acts as a flagged penalty whose taken
                    // width is its pre-chain. It stays transparent to the
                    // box bookkeeping, so a glue right after it is still a
                    // legal break.
                    let pre = disc.pre;
                    let hang = match list.tail(pre) {
                        Some(tail) => self.hang_at(list, Some(tail)),
                        None => self.hang_before(list, r),
                    };
                    self.try_break(
                        list,
                        Some(r),
                        self.settings.hyphen_penalty,
                        true,
                        natural_width(list, pre),
                        hang,
                    );
                }
                Node::Lang(_) | Node::StartStop(_) => {}
                node => {
                    self.totals.width += node.advance(Axis::Horizontal);
                    prev_is_box = node.is_box();
                }
            }
            last = Some(r);
            cur = list.next(r);
        }

        // A chain without the canonical terminator still ends somewhere.
        let terminated = last.is_some_and(|r| {
            matches!(&list[r], Node::Penalty(p) if p.penalty <= EJECT_PENALTY)
        });
        if last.is_some() && !terminated {
            self.try_break(list, None, EJECT_PENALTY, false, Sp::zero(), Sp::zero());
        }
    }

    /// Evaluate one legal break position against every active breakpoint,
    /// then keep the per-fitness-class winners.
    fn try_break(
        &mut self,
        list: &NodeList,
        pos: Option<NodeRef>,
        penalty: i32,
        flagged: bool,
        break_width: Sp,
        hang: Sp,
    ) {
        let forced = penalty <= EJECT_PENALTY;
        let mut candidates: [Option<Candidate>; 4] = [None; 4];
        let mut best = i64::MAX;
        let mut desperate: Option<(Candidate, Fitness)> = None;

        let mut prev: Option<usize> = None;
        let mut link = self.active;
        while let Some(i) = link {
            let entry_next = self.nodes[i].next;
            let target = self.line_width(self.nodes[i].line);
            let span = self.totals - self.nodes[i].totals + self.background;

            let (ratio, bad, elastic) =
                rate(target, span.width + break_width - hang, &span);

            if elastic || (ratio >= -1.0 && ratio < self.settings.tolerance) {
                let fit = Fitness::of(ratio);
                let demerits = self.demerits(bad, penalty, forced, flagged, fit, i);
                if demerits < best {
                    best = demerits;
                }
                let slot = &mut candidates[fit.index()];
                if slot.map_or(true, |c| demerits < c.demerits) {
                    *slot = Some(Candidate { demerits, from: i, ratio });
                }
            } else {
                // Remember the least bad evaluation, so the search can
                // always reach the end of the paragraph even when nothing
                // fits the tolerance. The resulting line reports its
                // saturated badness; degenerate layout is data, not an
                // error.
                let clamped = ratio.max(-1.0);
                let fit = Fitness::of(clamped);
                let demerits =
                    self.demerits(bad.min(INF_BAD), penalty, forced, flagged, fit, i);
                if desperate.map_or(true, |(c, _)| demerits < c.demerits) {
                    desperate = Some((Candidate { demerits, from: i, ratio: clamped }, fit));
                }
            }

            // Whether this breakpoint can still reach a feasible later
            // line. Break-taken width does not count here: it would be
            // wrong to prune a predecessor because of a wide hyphen when
            // the very next glue still fits.
            let (keep_ratio, _, keep_elastic) = rate(target, span.width, &span);
            if forced || (!keep_elastic && keep_ratio < -1.0) {
                match prev {
                    Some(p) => self.nodes[p].next = entry_next,
                    None => self.active = entry_next,
                }
            } else {
                prev = Some(i);
            }
            link = entry_next;
        }

        let margin = self.settings.fitness_demerits;
        let mut created = false;
        if best < i64::MAX {
            let after = self.totals_after(list, pos);
            for (class, candidate) in candidates.iter().enumerate() {
                if let Some(c) = candidate {
                    if c.demerits <= best.saturating_add(margin) {
                        self.activate(pos, flagged, hang, after, Fitness::ALL[class], *c);
                        created = true;
                    }
                }
            }
        }

        if !created && self.active.is_none() {
            if let Some((c, fit)) = desperate {
                let after = self.totals_after(list, pos);
                self.activate(pos, flagged, hang, after, fit, c);
            }
        }
    }

    fn activate(
        &mut self,
        pos: Option<NodeRef>,
        flagged: bool,
        hang: Sp,
        totals: Totals,
        fitness: Fitness,
        candidate: Candidate,
    ) {
        let idx = self.nodes.len();
        self.nodes.push(Breakpoint {
            pos,
            line: self.nodes[candidate.from].line + 1,
            fitness,
            demerits: candidate.demerits,
            ratio: candidate.ratio,
            flagged,
            hang,
            totals,
            from: candidate.from,
            next: self.active,
        });
        self.active = Some(idx);
    }

    fn demerits(
        &self,
        bad: u32,
        penalty: i32,
        forced: bool,
        flagged: bool,
        fitness: Fitness,
        from: usize,
    ) -> i64 {
        let base = 1 + bad as i64;
        let mut demerits = base * base;
        let p = penalty as i64;
        if penalty >= 0 {
            demerits += p * p;
        } else if !forced {
            demerits -= p * p;
        }
        if flagged && self.nodes[from].flagged {
            demerits += self.settings.double_hyphen_demerits;
        }
        if fitness.distance(self.nodes[from].fitness) > 1 {
            demerits += self.settings.fitness_demerits;
        }
        demerits + self.nodes[from].demerits
    }

    /// The target width of the line with the given index.
    fn line_width(&self, line: usize) -> Sp {
        let mut width = self.settings.hsize;
        if line < self.settings.indent_rows {
            width -= self.settings.indent;
        }
        width
    }

    /// The totals a breakpoint at `pos` carries into the rest of the scan:
    /// the running totals plus everything that vanishes after the break.
    fn totals_after(&self, list: &NodeList, pos: Option<NodeRef>) -> Totals {
        let mut after = self.totals;
        let Some(pos) = pos else { return after };
        if matches!(&list[pos], Node::Disc(_)) {
            // The word continues right after a discretionary; nothing is
            // discarded.
            return after;
        }
        let mut cur = Some(pos);
        while let Some(r) = cur {
            match &list[r] {
                Node::Glue(glue) => {
                    after.width += glue.width;
                    after.add_stretch(glue.stretch);
                    after.add_shrink(glue.shrink);
                }
                Node::Kern(kern) => after.width += kern.amount,
                // Only the break penalty itself vanishes; a later penalty
                // may be a break of its own and must stay reachable.
                Node::Penalty(_) if r == pos => {}
                _ => break,
            }
            cur = list.next(r);
        }
        after
    }

    /// The width of a trailing punctuation glyph allowed to hang into the
    /// margin before a break at `pos`, if the feature is on.
    fn hang_before(&self, list: &NodeList, pos: NodeRef) -> Sp {
        self.hang_at(list, list.prev(pos))
    }

    fn hang_at(&self, list: &NodeList, mut cursor: Option<NodeRef>) -> Sp {
        if !self.settings.hanging_punctuation_end {
            return Sp::zero();
        }
        while let Some(r) = cursor {
            if list[r].is_transparent() {
                cursor = list.prev(r);
            } else {
                break;
            }
        }
        if let Some(r) = cursor {
            if let Node::Glyph(glyph) = &list[r] {
                if hangs(glyph.codepoint) {
                    return glyph.width;
                }
            }
        }
        Sp::zero()
    }

    /// Find the finish with the lowest total demerits. After the final
    /// forced break, only finishing breakpoints remain active.
    fn retrace(&self) -> Vec<usize> {
        let mut finish = None;
        let mut link = self.active;
        while let Some(i) = link {
            if finish.map_or(true, |f: usize| self.nodes[i].demerits < self.nodes[f].demerits)
            {
                finish = Some(i);
            }
            link = self.nodes[i].next;
        }

        let mut chosen = Vec::with_capacity(16);
        let mut i = finish.unwrap_or(0);
        while i != 0 {
            chosen.push(i);
            i = self.nodes[i].from;
        }
        chosen.reverse();
        chosen
    }

    /// Cut the chain at the chosen breaks, finish each line and stack the
    /// packed lines into a vertical list.
    fn assemble(
        &self,
        list: &mut NodeList,
        head: Option<NodeRef>,
        chosen: &[usize],
    ) -> BrokenParagraph {
        let settings = self.settings;
        let mut lines = Vec::with_capacity(16);
        let mut start = head;

        for (index, &bp) in chosen.iter().enumerate() {
            let record = &self.nodes[bp];
            let (segment, rest) = self.split_line(list, start, record.pos);
            start = rest;

            let mut line = Chain::new();
            if index < settings.indent_rows && settings.indent != Sp::zero() {
                line.push(list, Node::Kern(Kern { amount: settings.indent }));
            }
            if let Some(template) = settings.line_start_glue {
                let copy = list.copy_list(Some(template));
                line.splice(list, copy);
            }
            line.splice(list, segment);

            // A taken discretionary contributes its pre-chain; a taken
            // penalty its width.
            let mut pre = None;
            let mut taken_width = Sp::zero();
            if let Some(pos) = record.pos {
                match &list[pos] {
                    Node::Disc(disc) => pre = disc.pre,
                    Node::Penalty(penalty) => taken_width = penalty.width,
                    _ => {}
                }
            }
            if pre.is_some() {
                let copy = list.copy_list(pre);
                line.splice(list, copy);
            } else if taken_width != Sp::zero() {
                line.push(list, Node::Kern(Kern { amount: taken_width }));
            }

            // Let the trailing punctuation hang as the scan assumed.
            if record.hang != Sp::zero() {
                line.push(list, Node::Kern(Kern { amount: -record.hang }));
            }

            if let Some(template) = settings.line_end_glue {
                let copy = list.copy_list(Some(template));
                line.splice(list, copy);
            }

            lines.push(hpack_span(
                list,
                line.head(),
                None,
                settings.hsize,
                settings.font_expansion,
            ));
        }

        // Stack the lines at a fixed leading. This is vertical chaining,
        // not a natural vpack: the line height wins over glyph metrics.
        let mut para = Chain::new();
        let mut width = Sp::zero();
        let mut height = Sp::zero();
        let mut depth = Sp::zero();
        let count = lines.len();
        for (index, &line) in lines.iter().enumerate() {
            para.push_ref(list, line);
            let Node::HList(hbox) = &list[line] else {
                unreachable!("lines are hlists");
            };
            width.set_max(hbox.width);
            if index + 1 == count {
                depth = hbox.depth;
                height += if settings.omit_last_leading {
                    hbox.height
                } else {
                    settings.line_height
                };
            } else {
                height += settings.line_height;
            }
        }

        let vlist = list.add(Node::VList(VBox {
            width,
            height,
            depth,
            glue_set: 0.0,
            badness: 0,
            head: para.head(),
        }));

        BrokenParagraph {
            vlist,
            breakpoints: chosen.iter().map(|&i| self.nodes[i].clone()).collect(),
        }
    }

    /// Detach the nodes of the line ending at `pos` and drop the material
    /// that vanishes with the break, returning the standalone line segment
    /// and the head of the remainder.
    fn split_line(
        &self,
        list: &mut NodeList,
        start: Option<NodeRef>,
        pos: Option<NodeRef>,
    ) -> (Option<NodeRef>, Option<NodeRef>) {
        let Some(pos) = pos else {
            // The synthesized final break: the rest is the line.
            return (start, None);
        };

        let segment = if start == Some(pos) {
            None
        } else {
            let end = list.prev(pos).expect("break position has a predecessor");
            list.split_after(end);
            start
        };

        // Drop the break node itself, then everything discardable after
        // it, mirroring `totals_after`.
        let disc_break = matches!(&list[pos], Node::Disc(_));
        let mut rest = list.split_after(pos);
        if !disc_break {
            while let Some(r) = rest {
                if !matches!(&list[r], Node::Glue(_) | Node::Kern(_)) {
                    break;
                }
                rest = list.split_after(r);
            }
        }
        (segment, rest)
    }
}

/// Rate a line of the given natural width against a target: the adjustment
/// ratio, its badness, and whether infinite-order glue is in play (which
/// forces badness to zero and feasibility regardless of the ratio).
fn rate(target: Sp, natural: Sp, span: &Totals) -> (f64, u32, bool) {
    let delta = target - natural;
    if delta > Sp::zero() {
        let (capacity, order) = span.effective_stretch();
        if capacity == Sp::zero() {
            (f64::INFINITY, INF_BAD, false)
        } else {
            let ratio = delta / capacity;
            if order.is_infinite() {
                (ratio, 0, true)
            } else {
                (ratio, badness(ratio), false)
            }
        }
    } else if delta < Sp::zero() {
        let (capacity, order) = span.effective_shrink();
        if capacity == Sp::zero() {
            (f64::NEG_INFINITY, AWFUL_BAD, false)
        } else {
            let ratio = delta / capacity;
            if order.is_infinite() {
                (ratio, 0, true)
            } else {
                (ratio, badness(ratio), false)
            }
        }
    } else {
        (0.0, 0, false)
    }
}

/// Whether a glyph may hang into the right margin.
fn hangs(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | '-' | '\u{2019}' | '\u{00BB}' | '\u{2026}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use galley_node::node::{Disc, Glue, Glyph, HBox, Penalty};

    fn glyph(c: char, width: f64) -> Node {
        Node::Glyph(Glyph::new(c, Sp::pt(width), Sp::pt(7.0), Sp::pt(2.0)))
    }

    fn space(width: f64, stretch: f64, shrink: f64) -> Node {
        Node::Glue(Glue::elastic(Sp::pt(width), Sp::pt(stretch), Sp::pt(shrink)))
    }

    fn build(list: &mut NodeList, nodes: Vec<Node>) -> Option<NodeRef> {
        let mut chain = Chain::new();
        for node in nodes {
            chain.push(list, node);
        }
        let head = chain.head();
        Some(list.append_paragraph_end(head))
    }

    fn settings(hsize: f64) -> LinebreakSettings {
        LinebreakSettings { hsize: Sp::pt(hsize), ..Default::default() }
    }

    /// The words of a paragraph as glyph chains with spaces in between.
    fn words(list: &mut NodeList, text: &str, char_width: f64) -> Option<NodeRef> {
        let mut chain = Chain::new();
        let mut first = true;
        for word in text.split_whitespace() {
            if !first {
                chain.push(list, space(3.0, 1.5, 1.0));
            }
            first = false;
            for c in word.chars() {
                chain.push(list, glyph(c, char_width));
            }
        }
        let head = chain.head();
        Some(list.append_paragraph_end(head))
    }

    fn line_boxes(list: &NodeList, para: &BrokenParagraph) -> Vec<HBox> {
        let Node::VList(vbox) = &list[para.vlist] else { panic!("expected vlist") };
        list.iter(vbox.head)
            .map(|r| match &list[r] {
                Node::HList(hbox) => hbox.clone(),
                _ => panic!("expected hlist children"),
            })
            .collect()
    }

    fn line_text(list: &NodeList, hbox: &HBox) -> String {
        list.iter(hbox.head)
            .filter_map(|r| match &list[r] {
                Node::Glyph(glyph) => Some(glyph.codepoint),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_validate_rejects_degenerate_settings() {
        assert!(settings(0.0).validate().is_err());
        assert!(settings(-10.0).validate().is_err());
        assert!(LinebreakSettings { tolerance: -1.0, ..settings(100.0) }
            .validate()
            .is_err());
        assert!(settings(100.0).validate().is_ok());
    }

    #[test]
    fn test_single_line_paragraph() {
        let mut list = NodeList::new();
        let head = build(
            &mut list,
            vec![glyph('h', 5.0), glyph('i', 3.0)],
        );
        let para = linebreak(&mut list, head, &settings(50.0)).unwrap();
        let lines = line_boxes(&list, &para);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].width, Sp::pt(50.0));
        // The terminator's glue soaks up the slack at no cost.
        assert_eq!(lines[0].badness, 0);
        assert_eq!(para.breakpoints.len(), 1);
        assert_eq!(para.breakpoints[0].line, 1);
    }

    #[test]
    fn test_breaks_at_spaces() {
        let mut list = NodeList::new();
        let head = words(&mut list, "aa bb cc dd", 5.0);
        // Each word is 10pt, a space 3pt: two words per 24pt line.
        let para = linebreak(&mut list, head, &settings(24.0)).unwrap();
        let lines = line_boxes(&list, &para);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&list, &lines[0]), "aabb");
        assert_eq!(line_text(&list, &lines[1]), "ccdd");
        for line in &lines {
            assert_eq!(line.width, Sp::pt(24.0));
        }
    }

    #[test]
    fn test_disc_does_not_shadow_following_glue() {
        let mut list = NodeList::new();
        let hyphen = list.add(glyph('-', 3.0));
        let head = build(
            &mut list,
            vec![
                glyph('a', 5.0),
                glyph('b', 5.0),
                Node::Disc(Disc { pre: Some(hyphen) }),
                space(3.0, 1.0, 1.0),
                glyph('c', 5.0),
                glyph('d', 5.0),
            ],
        );
        let para = linebreak(&mut list, head, &settings(10.0)).unwrap();
        let lines = line_boxes(&list, &para);

        // The glue after the disc must win the break: the first two glyphs
        // fit exactly, so taking the hyphen would overfill the line.
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&list, &lines[0]), "ab");
        assert_eq!(line_text(&list, &lines[1]), "cd");
        assert_eq!(lines[0].badness, 0);

        // And the chosen break references the glue, not the disc.
        let pos = para.breakpoints[0].pos.unwrap();
        assert!(matches!(&list[pos], Node::Glue(_)));
    }

    #[test]
    fn test_taken_disc_inserts_hyphen() {
        let mut list = NodeList::new();
        let hyphen = list.add(glyph('-', 3.0));
        // "abc<disc>def" with no spaces: only the disc can break.
        let head = build(
            &mut list,
            vec![
                glyph('a', 5.0),
                glyph('b', 5.0),
                glyph('c', 5.0),
                Node::Disc(Disc { pre: Some(hyphen) }),
                glyph('d', 5.0),
                glyph('e', 5.0),
                glyph('f', 5.0),
            ],
        );
        let para = linebreak(&mut list, head, &settings(18.0)).unwrap();
        let lines = line_boxes(&list, &para);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&list, &lines[0]), "abc-");
        assert_eq!(line_text(&list, &lines[1]), "def");

        // The hyphen in the line is a copy; the template glyph survives
        // unlinked in the arena for further breaks.
        let Node::Disc(_) = &list[para.breakpoints[0].pos.unwrap()] else {
            panic!("expected a disc break");
        };
    }

    #[test]
    fn test_forced_break_makes_paragraph_end() {
        let mut list = NodeList::new();
        let head = build(
            &mut list,
            vec![
                glyph('a', 5.0),
                Node::Penalty(Penalty::force()),
                glyph('b', 5.0),
            ],
        );
        let para = linebreak(&mut list, head, &settings(40.0)).unwrap();
        let lines = line_boxes(&list, &para);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&list, &lines[0]), "a");
        assert_eq!(line_text(&list, &lines[1]), "b");
        // Both lines end in stretchable material that costs nothing...
        assert_eq!(lines[1].badness, 0);
        // ...except the first, which has no glue at all and is underfull.
        assert_eq!(lines[0].badness, INF_BAD);
    }

    #[test]
    fn test_rebreak_is_deterministic() {
        let mut list = NodeList::new();
        let text = "the quick brown fox jumps over the lazy dog and keeps \
                    on running until the very end of the meadow";
        let head = words(&mut list, text, 4.0);
        let copy = list.copy_list(head);

        let settings = settings(60.0);
        let first = linebreak(&mut list, head, &settings).unwrap();
        let second = linebreak(&mut list, copy, &settings).unwrap();

        assert_eq!(first.breakpoints.len(), second.breakpoints.len());
        for (a, b) in first.breakpoints.iter().zip(&second.breakpoints) {
            assert_eq!(a.ratio.to_bits(), b.ratio.to_bits());
            assert_eq!(a.demerits, b.demerits);
            assert_eq!(a.line, b.line);
            assert_eq!(a.fitness, b.fitness);
        }
    }

    #[test]
    fn test_fitness_discontinuity_is_surcharged() {
        // The first line must shrink to its limit (tight), while the
        // second ends on the terminator's infinite stretch (very loose):
        // a jump of three classes.
        let tight_then_loose = |fitness_demerits: i64| {
            let mut list = NodeList::new();
            let head = build(
                &mut list,
                vec![
                    glyph('a', 10.0),
                    space(4.0, 2.0, 2.0),
                    glyph('b', 10.0),
                    Node::Penalty(Penalty::force()),
                    glyph('c', 10.0),
                    glyph('d', 10.0),
                ],
            );
            let settings = LinebreakSettings {
                fitness_demerits,
                ..settings(22.0)
            };
            let para = linebreak(&mut list, head, &settings).unwrap();
            para.breakpoints.last().unwrap().demerits
        };

        let with = tight_then_loose(100);
        let without = tight_then_loose(0);
        assert_eq!(with - without, 100);
    }

    #[test]
    fn test_double_hyphen_surcharge() {
        // A narrow measure forces two hyphenations in a row.
        let run = |double_hyphen_demerits: i64| {
            let mut list = NodeList::new();
            let mut chain = Chain::new();
            for chunk in 0..4 {
                for c in ['w', 'o', 'r'] {
                    chain.push(&mut list, glyph(c, 4.0));
                }
                if chunk < 3 {
                    let hyphen = list.add(glyph('-', 3.0));
                    chain.push(&mut list, Node::Disc(Disc { pre: Some(hyphen) }));
                }
            }
            let head = chain.head();
            let head = Some(list.append_paragraph_end(head));
            let settings = LinebreakSettings {
                double_hyphen_demerits,
                ..settings(15.0)
            };
            let para = linebreak(&mut list, head, &settings).unwrap();
            (para.breakpoints.last().unwrap().demerits, para.breakpoints.len())
        };

        let (with, lines_with) = run(3000);
        let (without, lines_without) = run(0);
        assert_eq!(lines_with, lines_without);
        // Three disc breaks in a row incur the surcharge twice.
        assert_eq!(with - without, 2 * 3000);
    }

    #[test]
    fn test_indentation_shortens_opening_lines() {
        let mut list = NodeList::new();
        let head = words(&mut list, "aa bb cc dd", 5.0);
        let settings = LinebreakSettings {
            indent: Sp::pt(6.0),
            indent_rows: 1,
            ..settings(30.0)
        };
        let para = linebreak(&mut list, head, &settings).unwrap();
        let lines = line_boxes(&list, &para);
        assert_eq!(lines.len(), 2);
        // 30pt minus 6pt of indent leaves room for exactly two 10pt words
        // and one space; the kern then pads the packed line back out.
        assert_eq!(line_text(&list, &lines[0]), "aabb");
        assert_eq!(lines[0].width, Sp::pt(30.0));
        let Some(first) = lines[0].head else { panic!("line is empty") };
        assert!(matches!(&list[first], Node::Kern(k) if k.amount == Sp::pt(6.0)));
    }

    #[test]
    fn test_line_templates_are_copied_in() {
        let mut list = NodeList::new();
        let start_template = {
            let mut chain = Chain::new();
            chain.push(&mut list, Node::Kern(Kern { amount: Sp::pt(2.0) }));
            chain.head()
        };
        let head = words(&mut list, "aa bb cc dd", 5.0);
        let settings = LinebreakSettings {
            line_start_glue: start_template,
            ..settings(26.0)
        };
        let para = linebreak(&mut list, head, &settings).unwrap();
        let lines = line_boxes(&list, &para);
        assert_eq!(lines.len(), 2);
        for line in &lines {
            let Some(first) = line.head else { panic!("line is empty") };
            assert!(matches!(&list[first], Node::Kern(k) if k.amount == Sp::pt(2.0)));
            // Each line got its own copy, never the template itself.
            assert_ne!(Some(first), start_template);
        }
    }

    #[test]
    fn test_vertical_assembly() {
        let mut list = NodeList::new();
        let head = words(&mut list, "aa bb cc dd", 5.0);
        let config = LinebreakSettings { line_height: Sp::pt(14.0), ..settings(24.0) };
        let para = linebreak(&mut list, head, &config).unwrap();
        let Node::VList(vbox) = &list[para.vlist] else { panic!("expected vlist") };
        assert_eq!(vbox.height, Sp::pt(28.0));
        assert_eq!(vbox.depth, Sp::pt(2.0));
        assert_eq!(vbox.width, Sp::pt(24.0));

        let omitted = {
            let mut list = NodeList::new();
            let head = words(&mut list, "aa bb cc dd", 5.0);
            let config = LinebreakSettings {
                line_height: Sp::pt(14.0),
                omit_last_leading: true,
                ..settings(24.0)
            };
            let para = linebreak(&mut list, head, &config).unwrap();
            let Node::VList(vbox) = &list[para.vlist] else { panic!("expected vlist") };
            vbox.height
        };
        // 14pt of leading plus the last line's natural 7pt of height.
        assert_eq!(omitted, Sp::pt(21.0));
    }

    #[test]
    fn test_hanging_punctuation() {
        let mut list = NodeList::new();
        let head = build(
            &mut list,
            vec![
                glyph('a', 5.0),
                glyph('b', 5.0),
                glyph(',', 2.0),
                space(3.0, 1.0, 1.0),
                glyph('c', 5.0),
                glyph('d', 5.0),
            ],
        );
        let settings = LinebreakSettings {
            hanging_punctuation_end: true,
            ..settings(10.0)
        };
        let para = linebreak(&mut list, head, &settings).unwrap();
        let lines = line_boxes(&list, &para);
        // "ab," fits the 10pt measure exactly only because the comma
        // hangs; without the feature the line would be overfull.
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&list, &lines[0]), "ab,");
        assert_eq!(lines[0].badness, 0);
    }

    #[test]
    fn test_unterminated_chain_still_breaks() {
        let mut list = NodeList::new();
        let mut chain = Chain::new();
        for c in ['x', 'y', 'z'] {
            chain.push(&mut list, glyph(c, 5.0));
        }
        let para = linebreak(&mut list, chain.head(), &settings(40.0)).unwrap();
        let lines = line_boxes(&list, &para);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&list, &lines[0]), "xyz");
    }

    #[test]
    fn test_empty_paragraph() {
        let mut list = NodeList::new();
        let para = linebreak(&mut list, None, &settings(40.0)).unwrap();
        let lines = line_boxes(&list, &para);
        assert!(lines.is_empty());
        assert!(para.breakpoints.is_empty());
    }

    #[test]
    fn test_even_paragraph_breaking() {
        let mut list = NodeList::new();
        let head = words(&mut list, "aa bb cc dd ee ff", 5.0);
        let para = linebreak(&mut list, head, &settings(24.0)).unwrap();
        let lines = line_boxes(&list, &para);
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&list, &lines[0]), "aabb");
        assert_eq!(line_text(&list, &lines[1]), "ccdd");
        assert_eq!(line_text(&list, &lines[2]), "eeff");
        for line in &lines {
            assert_eq!(line.width, Sp::pt(24.0));
        }
        // Breakpoint records line up with the lines they close.
        let lines_of: Vec<_> = para.breakpoints.iter().map(|b| b.line).collect();
        assert_eq!(lines_of, vec![1, 2, 3]);
    }
}
