//! Live per-page flow: overflow and underflow between editable surfaces
//!
//! Each page is an independent editable surface. Mutations schedule a check
//! for the touched surface; checks run on the next [`LiveFlowController::tick`]
//! against a real [`RenderSurface`], pushing a suffix forward when a page
//! overflows its viewport and pulling a prefix back when it is under-filled.
//! Content only ever moves between neighbors, so the concatenation of all
//! surfaces is preserved exactly.

pub mod measure;
mod scheduler;
pub mod surface;

pub use measure::{EstimateSurface, FnSurface, MeasureScope, MeasureStyle, RenderSurface};
pub use scheduler::CheckScheduler;
pub use surface::{Focus, NavKey, PageSurface, SurfaceId};

use crate::config::FlowOptions;
use crate::layout::{ContentPage, LayoutConfig};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use surface::{byte_offset, grapheme_bounds, grapheme_len};

/// What a single check did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Nothing to do; re-running is a no-op
    Stable,
    /// Content from `cut` onward moved to the start of `successor`
    Overflowed {
        cut: usize,
        successor: SurfaceId,
        created: bool,
    },
    /// `pulled` graphemes moved from the start of `donor`
    Underfilled {
        pulled: usize,
        donor: SurfaceId,
        donor_removed: bool,
    },
}

/// Accumulated effects of one or more ticks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowReport {
    pub checked: usize,
    pub overflowed: SmallVec<[SurfaceId; 4]>,
    pub underfilled: SmallVec<[SurfaceId; 4]>,
    pub created: SmallVec<[SurfaceId; 2]>,
    pub removed: SmallVec<[SurfaceId; 2]>,
}

impl FlowReport {
    pub fn has_changes(&self) -> bool {
        !self.overflowed.is_empty() || !self.underfilled.is_empty()
    }

    fn record(&mut self, id: SurfaceId, outcome: CheckOutcome) {
        self.checked += 1;
        match outcome {
            CheckOutcome::Stable => {}
            CheckOutcome::Overflowed {
                successor, created, ..
            } => {
                self.overflowed.push(id);
                if created {
                    self.created.push(successor);
                }
            }
            CheckOutcome::Underfilled {
                donor,
                donor_removed,
                ..
            } => {
                self.underfilled.push(id);
                if donor_removed {
                    self.removed.push(donor);
                }
            }
        }
    }

    fn merge(&mut self, other: FlowReport) {
        self.checked += other.checked;
        self.overflowed.extend(other.overflowed);
        self.underfilled.extend(other.underfilled);
        self.created.extend(other.created);
        self.removed.extend(other.removed);
    }
}

/// Interactive page flow for one editing session.
///
/// Surfaces live in an id-keyed arena; `order` is the page sequence. The
/// surfaces are the source of truth while typing and are folded back into a
/// document only on an explicit relayout.
#[derive(Debug)]
pub struct LiveFlowController {
    surfaces: FxHashMap<SurfaceId, PageSurface>,
    order: Vec<SurfaceId>,
    next_id: u64,
    focus: Option<Focus>,
    scheduler: CheckScheduler,
    style: MeasureStyle,
    viewport_height: f32,
    options: FlowOptions,
}

impl LiveFlowController {
    /// Controller with one empty page sized by `config`
    pub fn new(config: &LayoutConfig, options: FlowOptions) -> Self {
        let style = MeasureStyle::from_layout(config, &options.font_family);
        let viewport = measure::viewport_height(&config.page);
        Self::with_viewport(style, viewport, options)
    }

    /// Controller for a host that supplies its own style and viewport
    pub fn with_viewport(style: MeasureStyle, viewport_height: f32, options: FlowOptions) -> Self {
        let mut controller = Self {
            surfaces: FxHashMap::default(),
            order: Vec::new(),
            next_id: 0,
            focus: None,
            scheduler: CheckScheduler::new(),
            style,
            viewport_height,
            options,
        };
        let first = controller.alloc(String::new());
        controller.order.push(first);
        controller
    }

    /// Controller seeded from a static split
    pub fn from_pages(pages: &[ContentPage], config: &LayoutConfig, options: FlowOptions) -> Self {
        let mut controller = Self::new(config, options);
        controller.load(pages.iter().map(|p| p.content.clone()));
        controller
    }

    /// Replace every surface with `contents`, one per page
    pub fn load<I>(&mut self, contents: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.surfaces.clear();
        self.order.clear();
        self.focus = None;
        self.scheduler = CheckScheduler::new();
        for content in contents {
            let id = self.alloc(content);
            self.order.push(id);
        }
        if self.order.is_empty() {
            let id = self.alloc(String::new());
            self.order.push(id);
        }
    }

    fn alloc(&mut self, content: String) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(id, PageSurface::new(id, content));
        id
    }

    fn index_of(&self, id: SurfaceId) -> Option<usize> {
        self.order.iter().position(|&s| s == id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Surface ids in page order
    pub fn surface_ids(&self) -> &[SurfaceId] {
        &self.order
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&PageSurface> {
        self.surfaces.get(&id)
    }

    /// 1-based page number of a surface
    pub fn page_number(&self, id: SurfaceId) -> Option<usize> {
        self.index_of(id).map(|idx| idx + 1)
    }

    pub fn contents(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter_map(|id| self.surfaces.get(id))
            .map(|s| s.content.as_str())
            .collect()
    }

    pub fn joined_content(&self) -> String {
        self.contents().concat()
    }

    /// Current surfaces as page records, numbered contiguously
    pub fn pages(&self) -> Vec<ContentPage> {
        self.contents()
            .into_iter()
            .enumerate()
            .map(|(idx, content)| ContentPage::from_content(idx + 1, content))
            .collect()
    }

    pub fn focus(&self) -> Option<Focus> {
        self.focus
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    pub fn style(&self) -> &MeasureStyle {
        &self.style
    }

    /// Place a collapsed caret; `offset` is clamped to the surface length
    pub fn set_focus(&mut self, id: SurfaceId, offset: usize) -> bool {
        match self.surfaces.get(&id) {
            Some(surface) => {
                self.focus = Some(Focus::caret(id, offset.min(surface.len())));
                true
            }
            None => false,
        }
    }

    /// Adopt a new geometry; every surface is re-checked
    pub fn set_layout(&mut self, config: &LayoutConfig) {
        self.style = MeasureStyle::from_layout(config, &self.options.font_family);
        self.viewport_height = measure::viewport_height(&config.page);
        for &id in &self.order {
            self.scheduler.schedule(id);
        }
    }

    /// Replace a surface's content after a user edit
    pub fn set_content(&mut self, id: SurfaceId, content: impl Into<String>) -> bool {
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return false;
        };
        surface.content = content.into();
        let len = surface.len();
        if let Some(focus) = self.focus.as_mut().filter(|f| f.surface == id) {
            focus.anchor = focus.anchor.min(len);
            focus.active = focus.active.min(len);
        }
        self.scheduler.schedule(id);
        true
    }

    /// Type at the caret, replacing any selection
    pub fn type_text(&mut self, text: &str) -> bool {
        let Some(focus) = self.focus else {
            return false;
        };
        let Some(surface) = self.surfaces.get_mut(&focus.surface) else {
            return false;
        };
        let start = focus.anchor.min(focus.active);
        let end = focus.anchor.max(focus.active);
        let start_byte = byte_offset(&surface.content, start);
        let end_byte = byte_offset(&surface.content, end);
        surface.content.replace_range(start_byte..end_byte, text);

        let caret = grapheme_len(&surface.content[..start_byte + text.len()]);
        self.focus = Some(Focus::caret(focus.surface, caret));
        self.scheduler.schedule(focus.surface);
        true
    }

    /// Backspace inside the focused surface. Does nothing at offset zero.
    pub fn delete_backward(&mut self) -> bool {
        let Some(focus) = self.focus else {
            return false;
        };
        let Some(surface) = self.surfaces.get_mut(&focus.surface) else {
            return false;
        };
        let (start, end) = if focus.is_collapsed() {
            if focus.active == 0 {
                return false;
            }
            (focus.active - 1, focus.active)
        } else {
            (focus.anchor.min(focus.active), focus.anchor.max(focus.active))
        };
        let start_byte = byte_offset(&surface.content, start);
        let end_byte = byte_offset(&surface.content, end);
        surface.content.replace_range(start_byte..end_byte, "");
        self.focus = Some(Focus::caret(focus.surface, start));
        self.scheduler.schedule(focus.surface);
        true
    }

    /// Queue a check for the next tick, superseding a pending one
    pub fn schedule_check(&mut self, id: SurfaceId) {
        self.scheduler.schedule(id);
    }

    pub fn has_pending(&self) -> bool {
        !self.scheduler.is_empty()
    }

    /// Run every check that is due. Checks scheduled while running wait for
    /// the next tick.
    pub fn tick<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> FlowReport {
        let mut report = FlowReport::default();
        for id in self.scheduler.take_due() {
            let outcome = self.check(id, surface);
            report.record(id, outcome);
        }
        report
    }

    /// Tick until nothing is pending or the configured limit is reached
    pub fn settle<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> FlowReport {
        let mut report = FlowReport::default();
        for _ in 0..self.options.settle_limit {
            if self.scheduler.is_empty() {
                return report;
            }
            report.merge(self.tick(surface));
        }
        if !self.scheduler.is_empty() {
            log::warn!(
                "flow did not settle after {} ticks; {} checks still pending",
                self.options.settle_limit,
                self.scheduler.len()
            );
        }
        report
    }

    /// Run one overflow/underflow check now.
    ///
    /// The measuring probe is held only for the duration of the check.
    pub fn check<S: RenderSurface + ?Sized>(
        &mut self,
        id: SurfaceId,
        surface: &mut S,
    ) -> CheckOutcome {
        let Some(index) = self.index_of(id) else {
            return CheckOutcome::Stable;
        };
        let Some(page) = self.surfaces.get(&id) else {
            return CheckOutcome::Stable;
        };
        let viewport = self.viewport_height;
        let mut scope = MeasureScope::new(surface, &self.style);
        let height = scope.height_of(&page.content);

        if height > viewport {
            let cut = find_cut(&mut scope, &page.content, viewport, &self.options);
            drop(scope);
            return match cut {
                Some(cut) => self.push_overflow(index, cut),
                None => CheckOutcome::Stable,
            };
        }

        let underfilled = viewport > 0.0 && height / viewport < self.options.underflow_ratio;
        if !underfilled {
            return CheckOutcome::Stable;
        }
        let Some(donor) = self
            .order
            .get(index + 1)
            .and_then(|next| self.surfaces.get(next))
            .filter(|donor| !donor.is_empty())
        else {
            return CheckOutcome::Stable;
        };

        let take = pull_amount(&mut scope, &page.content, &donor.content, viewport, &self.options);
        drop(scope);
        if take == 0 {
            return CheckOutcome::Stable;
        }
        self.pull_back(index, take)
    }

    /// Move everything from grapheme `cut` on to the next page
    fn push_overflow(&mut self, index: usize, cut: usize) -> CheckOutcome {
        let id = self.order[index];
        let Some(page) = self.surfaces.get_mut(&id) else {
            return CheckOutcome::Stable;
        };
        let split = byte_offset(&page.content, cut);
        let overflow = page.content.split_off(split);
        let overflow_len = grapheme_len(&overflow);

        let existing = self.order.get(index + 1).copied();
        let (successor, created) = match existing.and_then(|next| self.surfaces.get_mut(&next)) {
            Some(next) => {
                next.content.insert_str(0, &overflow);
                (next.id, false)
            }
            None => {
                let next = self.alloc(overflow);
                self.order.insert(index + 1, next);
                (next, true)
            }
        };

        if let Some(focus) = self.focus {
            if focus.surface == id && focus.active >= cut {
                self.focus = Some(focus.transferred(successor, cut));
            } else if focus.surface == successor {
                self.focus = Some(Focus {
                    surface: successor,
                    anchor: focus.anchor + overflow_len,
                    active: focus.active + overflow_len,
                });
            }
        }

        log::debug!(
            "overflow: page {} kept {} graphemes, pushed {} to {:?}{}",
            index + 1,
            cut,
            overflow_len,
            successor,
            if created { " (new page)" } else { "" }
        );

        self.scheduler.schedule(successor);
        CheckOutcome::Overflowed {
            cut,
            successor,
            created,
        }
    }

    /// Append the first `take` graphemes of the next page to this one
    fn pull_back(&mut self, index: usize, take: usize) -> CheckOutcome {
        let id = self.order[index];
        let donor_id = self.order[index + 1];
        let Some(donor) = self.surfaces.get_mut(&donor_id) else {
            return CheckOutcome::Stable;
        };
        let split = byte_offset(&donor.content, take);
        let rest = donor.content.split_off(split);
        let pulled = std::mem::replace(&mut donor.content, rest);
        let donor_removed = donor.is_empty();

        let Some(target) = self.surfaces.get_mut(&id) else {
            return CheckOutcome::Stable;
        };
        let base = target.len();
        target.content.push_str(&pulled);

        if donor_removed {
            self.surfaces.remove(&donor_id);
            self.order.remove(index + 1);
            self.scheduler.cancel(donor_id);
        }

        if let Some(focus) = self.focus.filter(|f| f.surface == donor_id) {
            let remap = |offset: usize| {
                if donor_removed || offset < take {
                    (id, base + offset)
                } else {
                    (donor_id, offset - take)
                }
            };
            let (surface, active) = remap(focus.active);
            let (anchor_surface, anchor) = remap(focus.anchor);
            self.focus = Some(if anchor_surface == surface {
                Focus {
                    surface,
                    anchor,
                    active,
                }
            } else {
                Focus::caret(surface, active)
            });
        }

        log::debug!(
            "underflow: page {} pulled {} graphemes from {:?}{}",
            index + 1,
            take,
            donor_id,
            if donor_removed { " (donor removed)" } else { "" }
        );

        self.scheduler.schedule(id);
        if !donor_removed {
            self.scheduler.schedule(donor_id);
        }
        CheckOutcome::Underfilled {
            pulled: take,
            donor: donor_id,
            donor_removed,
        }
    }

    /// Cross-page caret movement. Returns true when focus changed page, in
    /// which case the host should suppress the key's default action.
    pub fn handle_key(&mut self, key: NavKey) -> bool {
        let Some(focus) = self.focus else {
            return false;
        };
        let Some(index) = self.index_of(focus.surface) else {
            return false;
        };
        let len = self.surfaces.get(&focus.surface).map_or(0, PageSurface::len);
        let prev = index.checked_sub(1).map(|i| self.order[i]);
        let next = self.order.get(index + 1).copied();

        let target = match key {
            NavKey::ArrowUp if focus.active == 0 => prev.map(|id| {
                let end = self.surfaces.get(&id).map_or(0, PageSurface::len);
                Focus::caret(id, end)
            }),
            NavKey::ArrowDown if focus.active >= len => next.map(|id| Focus::caret(id, 0)),
            NavKey::Tab => next.map(|id| Focus::caret(id, 0)),
            _ => None,
        };

        match target {
            Some(target) => {
                self.focus = Some(target);
                true
            }
            None => false,
        }
    }
}

fn is_newline(grapheme: &str) -> bool {
    grapheme == "\n" || grapheme == "\r\n"
}

fn is_space(grapheme: &str) -> bool {
    grapheme == " " || grapheme == "\t"
}

fn is_break(grapheme: &str) -> bool {
    grapheme.chars().all(char::is_whitespace)
}

/// Grapheme index to cut an overflowing page at, or `None` when the whole
/// content already fits.
fn find_cut<S: RenderSurface + ?Sized>(
    scope: &mut MeasureScope<'_, S>,
    content: &str,
    viewport: f32,
    options: &FlowOptions,
) -> Option<usize> {
    let bounds = grapheme_bounds(content);
    let len = bounds.len() - 1;

    // Largest prefix that still fits
    let (mut lo, mut hi) = (0, len);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if scope.height_of(&content[..bounds[mid]]) <= viewport {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    // Keep at least one grapheme so a cascade always makes progress
    let cut = snap_back(content, &bounds, lo, options).max(1);
    (cut < len).then_some(cut)
}

/// Move `fit` back to just after a newline, else a space, within the
/// configured lookbacks. Never moves forward.
fn snap_back(content: &str, bounds: &[usize], fit: usize, options: &FlowOptions) -> usize {
    let grapheme = |i: usize| &content[bounds[i]..bounds[i + 1]];

    let newline_floor = fit.saturating_sub(options.newline_lookback);
    if let Some(i) = (newline_floor..fit).rev().find(|&i| is_newline(grapheme(i))) {
        return i + 1;
    }
    let space_floor = fit.saturating_sub(options.space_lookback);
    if let Some(i) = (space_floor..fit).rev().find(|&i| is_space(grapheme(i))) {
        return i + 1;
    }
    fit
}

/// Graphemes an under-filled page can take from its donor without
/// overflowing, ending on a word boundary.
fn pull_amount<S: RenderSurface + ?Sized>(
    scope: &mut MeasureScope<'_, S>,
    current: &str,
    donor: &str,
    viewport: f32,
    options: &FlowOptions,
) -> usize {
    let bounds = grapheme_bounds(donor);
    let donor_len = bounds.len() - 1;
    let limit = options.pull_limit.min(donor_len);

    let mut joined = String::with_capacity(current.len() + bounds[limit]);
    let (mut lo, mut hi) = (0, limit);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        joined.clear();
        joined.push_str(current);
        joined.push_str(&donor[..bounds[mid]]);
        if scope.height_of(&joined) <= viewport {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    let grapheme = |i: usize| &donor[bounds[i]..bounds[i + 1]];
    if lo == 0 || lo == donor_len || is_break(grapheme(lo)) || is_break(grapheme(lo - 1)) {
        return lo;
    }
    (0..lo)
        .rev()
        .find(|&i| is_break(grapheme(i)))
        .map_or(0, |i| i + 1)
}
