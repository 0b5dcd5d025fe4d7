// Copyright 2025 the Runebender Xilem Authors
// SPDX-License-Identifier: Apache-2.0

//! Interaction state machine.
//!
//! `InteractionSession` owns everything that lives across frames: mode,
//! app state, selection, drag anchors, the camera and the cached store
//! snapshots. The host calls `step` once per frame with the accumulated
//! input and a hit tester; the session advances, emits actions through the
//! sink and returns what the painter should draw.

pub mod camera;
pub mod hit;
pub mod input;
pub mod output;
pub mod state;

pub use camera::Camera;
pub use hit::{GeometryHitTester, HitTester};
pub use input::{InputState, Modifiers};
pub use output::{CursorHint, DependencyLink, FrameOutput, GuideLine, LockAxis};
pub use state::{AppState, CanvasMode};

use crate::actions::{
    Action, ActionSink, ComponentChange, ComponentClassChange, ItemSnapshot, LetterSpacing,
    PointsReset, StoreValue, ViewMatrix,
};
use crate::config::EditorConfig;
use crate::editing::{self, Edit, EditModifiers, Item, ItemKind, OnCurveMode, Selection, SpacingSide};
use crate::model::{Changes, ConstructedGlyph, PointPath};
use crate::settings;
use kurbo::{Point, Rect, Size, Vec2};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// UI flags from the host's settings store
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiSnapshot {
    pub canvas_mode: CanvasMode,
    pub ui_outline: bool,
    /// Show what the selected point was computed from
    pub dependencies: bool,
    pub glyph_outside_view: bool,
}

/// A pointer drag in progress
#[derive(Debug, Clone)]
struct DragState {
    /// Press position in screen pixels
    anchor: Point,
    anchor_world: Point,
    /// Dragged items with their positions at press time
    starts: Vec<(Item, Point)>,
    started: bool,
    lock: LockAxis,
    lock_frozen: bool,
}

/// Hot items split by what they can do
#[derive(Debug, Default)]
struct Hits {
    nodes: Vec<Item>,
    spacing: Vec<Item>,
    contours: Vec<Item>,
    components: Vec<Item>,
    choices: Vec<Item>,
    class_choices: Vec<Item>,
}

impl Hits {
    /// With a contour selected, only its own points are grabbable
    fn sort(hot: &[Item], contour: Option<&Item>) -> Self {
        let mut hits = Hits::default();
        for item in hot {
            let bucket = match item.kind {
                _ if item.is_point() => {
                    if contour.is_some_and(|c| !item.id.starts_with(&c.id)) {
                        continue;
                    }
                    &mut hits.nodes
                }
                ItemKind::Spacing { .. } => &mut hits.spacing,
                ItemKind::Contour { .. } => &mut hits.contours,
                ItemKind::Component { .. } => &mut hits.components,
                ItemKind::ComponentChoice { .. } => &mut hits.choices,
                ItemKind::ComponentClassChoice { .. } => &mut hits.class_choices,
                _ => continue,
            };
            bucket.push(item.clone());
        }
        hits
    }

    fn on_menu(&self) -> bool {
        !self.choices.is_empty() || !self.class_choices.is_empty()
    }
}

/// Counts what goes through so the frame knows whether to redraw
struct CountingSink<'a> {
    inner: &'a mut dyn ActionSink,
    count: usize,
}

impl ActionSink for CountingSink<'_> {
    fn dispatch(&mut self, action: Action) {
        self.count += 1;
        self.inner.dispatch(action);
    }
}

pub struct InteractionSession {
    config: EditorConfig,
    glyph: Option<Arc<ConstructedGlyph>>,
    ui: UiSnapshot,
    values: BTreeMap<String, f64>,
    /// A different glyph arrived since the last frame
    glyph_changed: bool,
    needs_fit: bool,
    mode: CanvasMode,
    state: AppState,
    selection: Selection,
    published_selection: Selection,
    contour: Option<Item>,
    contour_cycle: usize,
    contour_hits: Vec<PointPath>,
    box_anchor: Option<Point>,
    drag: Option<DragState>,
    last_press: Option<Duration>,
    camera: Camera,
    /// Mode and state to restore when the pan key is released
    pan_saved: Option<(CanvasMode, AppState)>,
    preview_saved: Option<Camera>,
    hovered_component: Option<usize>,
    outside_view: bool,
    last_hot: Vec<PointPath>,
    torn_down: bool,
}

impl InteractionSession {
    pub fn new(config: EditorConfig) -> Self {
        tracing::info!("[InteractionSession] created");
        Self {
            config,
            glyph: None,
            ui: UiSnapshot::default(),
            values: BTreeMap::new(),
            glyph_changed: false,
            needs_fit: true,
            mode: CanvasMode::default(),
            state: AppState::DEFAULT,
            selection: Selection::new(),
            published_selection: Selection::new(),
            contour: None,
            contour_cycle: 0,
            contour_hits: Vec::new(),
            box_anchor: None,
            drag: None,
            last_press: None,
            camera: Camera::default(),
            pan_saved: None,
            preview_saved: None,
            hovered_component: None,
            outside_view: false,
            last_hot: Vec::new(),
            torn_down: false,
        }
    }

    // ============================================================================
    // STORE SNAPSHOTS
    // ============================================================================

    /// Replace the cached glyph. A glyph with another name ends whatever
    /// interaction is in progress on the next frame.
    pub fn set_glyph(&mut self, glyph: Option<ConstructedGlyph>) {
        if let (Some(old), Some(new)) = (&self.glyph, &glyph)
            && old.name != new.name
        {
            self.glyph_changed = true;
        }
        if self.glyph.is_none() {
            self.needs_fit = true;
        }
        self.glyph = glyph.map(Arc::new);
    }

    pub fn set_ui(&mut self, ui: UiSnapshot) {
        self.outside_view = ui.glyph_outside_view;
        self.ui = ui;
    }

    pub fn set_values(&mut self, values: BTreeMap<String, f64>) {
        self.values = values;
    }

    // ============================================================================
    // ACCESSORS
    // ============================================================================

    pub fn glyph(&self) -> Option<&ConstructedGlyph> {
        self.glyph.as_deref()
    }

    pub fn mode(&self) -> CanvasMode {
        self.mode
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ============================================================================
    // PARAMETER PANEL
    // ============================================================================

    pub fn change_param(&self, name: &str, value: f64, sink: &mut dyn ActionSink) {
        sink.dispatch(Action::change_param(&self.values, name, value));
    }

    pub fn download(&self, sink: &mut dyn ActionSink) {
        sink.dispatch(Action::download(&self.values));
    }

    /// Stop reacting to input. Later `step` calls do nothing.
    pub fn teardown(&mut self) {
        if !self.torn_down {
            tracing::info!("[InteractionSession] torn down");
        }
        self.torn_down = true;
        self.drag = None;
        self.box_anchor = None;
        self.pan_saved = None;
        self.preview_saved = None;
        self.last_press = None;
    }

    // ============================================================================
    // FRAME
    // ============================================================================

    /// Advance one frame. Input edges are consumed even when nothing happens.
    pub fn step(
        &mut self,
        input: &mut InputState,
        hits: &dyn HitTester,
        sink: &mut dyn ActionSink,
    ) -> FrameOutput {
        let mut sink = CountingSink {
            inner: sink,
            count: 0,
        };
        let output = self.advance(input, hits, &mut sink);
        input.end_frame();
        output
    }

    fn advance(
        &mut self,
        input: &InputState,
        hits: &dyn HitTester,
        sink: &mut CountingSink<'_>,
    ) -> FrameOutput {
        let idle = FrameOutput {
            mode: self.mode,
            state: self.state,
            camera: self.camera,
            ..Default::default()
        };
        if self.torn_down {
            return idle;
        }
        let Some(glyph) = self.glyph.clone() else {
            return idle;
        };
        let camera_before = self.camera;
        let state_before = self.state;

        if std::mem::take(&mut self.glyph_changed) {
            tracing::debug!("[InteractionSession] glyph changed to {}, resetting", glyph.name);
            self.reset_interaction();
        }
        if std::mem::take(&mut self.needs_fit) {
            self.reset_view(&glyph, input.viewport);
        }

        let mut pressed = input.pointer_pressed;
        if pressed && self.is_double_click(input.time) {
            tracing::debug!("[InteractionSession] double click, resetting view");
            self.reset_view(&glyph, input.viewport);
            pressed = false;
        }

        self.update_mode(input, sink);

        let hot = hits.hot_items(&glyph, &self.camera, input.pointer);
        let boxed = match self.box_anchor {
            Some(anchor) => hits.box_items(&glyph, &self.camera, anchor, input.pointer),
            None => Vec::new(),
        };
        let sorted = Hits::sort(&hot, self.contour.as_ref());

        match self.mode {
            CanvasMode::Move => {
                let primary = if input.pointer_down {
                    AppState::MOVING
                } else {
                    AppState::DEFAULT
                };
                self.state = self.state.with_primary(primary);
            }
            CanvasMode::Components => {
                self.step_components(&glyph, &sorted, input.pointer_released, sink);
            }
            CanvasMode::SelectPoints => self.step_select_points(
                &glyph,
                &sorted,
                &boxed,
                pressed,
                input.pointer_released,
                input.pointer,
                sink,
            ),
        }

        self.state.set(AppState::ZOOMING, input.wheel != 0.0);
        if self.state.primary() != state_before.primary() {
            tracing::debug!(
                "[InteractionSession] {:?} -> {:?}",
                state_before.primary(),
                self.state.primary()
            );
        }

        let preview_key = self.config.keys.preview;
        if input.key_pressed(preview_key) {
            self.preview_saved = Some(self.camera);
            self.reset_view(&glyph, input.viewport);
        }
        if input.key_released(preview_key)
            && let Some(saved) = self.preview_saved.take()
        {
            self.camera = saved;
        }
        let preview = input.is_key_down(preview_key);

        self.update_drag(input.pointer);

        let mut guide = None;
        let mut dependency_links = Vec::new();
        if !preview {
            if self.state.resets_points()
                && input.key_pressed(self.config.keys.escape)
                && !self.selection.is_empty()
            {
                sink.dispatch(Action::ResetGlyphPointsManually(PointsReset {
                    glyph_name: glyph.override_name().to_string(),
                    unicode: glyph.unicode,
                    points: self.selection.iter().map(ItemSnapshot::from).collect(),
                }));
            }

            if self.state.contains(AppState::MOVING) {
                self.camera.pan(input.pointer_delta);
            } else if self.state.contains(AppState::ZOOMING) {
                self.camera.zoom_at(input.pointer, input.wheel, &self.config.camera);
            }

            guide = self.apply_interactions(&glyph, input, sink);

            if self.ui.dependencies
                && self.state.intersects(AppState::SINGLE_POINT_SELECTED)
                && let Some(item) = self.selection.single()
            {
                dependency_links = dependency_links_of(&glyph, item);
            }
        }

        self.publish_visibility(&glyph, input.viewport, sink);
        if self.selection != self.published_selection {
            sink.dispatch(Action::store(StoreValue {
                selected_items: Some(self.selection.iter().map(ItemSnapshot::from).collect()),
                ..Default::default()
            }));
            self.published_selection = self.selection.clone();
        }
        if self.camera != camera_before {
            sink.dispatch(Action::store(StoreValue {
                glyph_view_matrix: Some(ViewMatrix {
                    t: self.camera.translation.to_point(),
                    z: self.camera.zoom,
                }),
                ..Default::default()
            }));
        }

        let cursor = if self.mode == CanvasMode::SelectPoints
            && !self.state.is_dragging_points()
            && !sorted.spacing.is_empty()
        {
            CursorHint::EwResize
        } else {
            CursorHint::Default
        };

        let hot_ids: Vec<PointPath> = hot.iter().map(|i| i.id.clone()).collect();
        let redraw = sink.count > 0
            || self.camera != camera_before
            || self.state != state_before
            || hot_ids != self.last_hot;
        self.last_hot = hot_ids;

        let box_selecting = self.state.contains(AppState::BOX_SELECTING);
        let menu_open = self
            .state
            .intersects(AppState::COMPONENT_HOVERED | AppState::COMPONENT_MENU_HOVERED);
        FrameOutput {
            mode: self.mode,
            state: self.state,
            hot_items: hot,
            selection: self.selection.clone(),
            boxed_items: if box_selecting { boxed } else { Vec::new() },
            box_rect: self
                .box_anchor
                .filter(|_| box_selecting)
                .map(|anchor| {
                    Rect::from_points(
                        self.camera.to_world(anchor),
                        self.camera.to_world(input.pointer),
                    )
                }),
            selected_contour: self
                .contour
                .clone()
                .filter(|_| self.state.intersects(AppState::CONTOUR_ACTIVE)),
            hovered_component: self.hovered_component,
            component_menu: self.hovered_component.filter(|_| menu_open),
            cursor,
            guide,
            dependency_links,
            camera: self.camera,
            preview,
            redraw,
        }
    }

    /// Resolve this frame's mode, handling the pan key
    fn update_mode(&mut self, input: &InputState, sink: &mut dyn ActionSink) {
        let previous = self.mode;
        let pan = self.config.keys.pan;
        let mut mode = self.ui.canvas_mode;
        let mut restored = None;

        if input.key_released(pan)
            && let Some((saved_mode, saved_state)) = self.pan_saved.take()
        {
            mode = saved_mode;
            self.ui.canvas_mode = saved_mode;
            restored = Some(saved_state);
            sink.dispatch(Action::store(StoreValue {
                canvas_mode: Some(saved_mode),
                ..Default::default()
            }));
        } else if input.key_pressed(pan) && self.pan_saved.is_none() {
            self.pan_saved = Some((mode, self.state));
            sink.dispatch(Action::store(StoreValue {
                canvas_mode: Some(CanvasMode::Move),
                ..Default::default()
            }));
        }

        if self.pan_saved.is_some() {
            mode = CanvasMode::Move;
        }
        self.mode = mode;

        if let Some(saved) = restored {
            let primary = if mode == CanvasMode::SelectPoints {
                saved
            } else {
                AppState::DEFAULT
            };
            self.state = self.state.with_primary(primary);
        } else if mode != previous && self.pan_saved.is_none() {
            tracing::debug!("[InteractionSession] mode {:?} -> {:?}", previous, mode);
            self.reset_interaction();
        }
    }

    fn step_components(
        &mut self,
        glyph: &ConstructedGlyph,
        hits: &Hits,
        released: bool,
        sink: &mut dyn ActionSink,
    ) {
        let mut components = hits.components.as_slice();
        let mut on_menu = hits.on_menu();

        if released {
            if let Some(ItemKind::ComponentChoice { component, base }) =
                hits.choices.first().map(|i| &i.kind)
            {
                sink.dispatch(Action::ChangeComponent(ComponentChange {
                    glyph: glyph.name.clone(),
                    id: component.clone(),
                    name: base.clone(),
                }));
                components = &[];
                on_menu = false;
            }
            if let Some(ItemKind::ComponentClassChoice { class, base }) =
                hits.class_choices.first().map(|i| &i.kind)
            {
                sink.dispatch(Action::ChangeComponentClass(ComponentClassChange {
                    component_class: class.clone(),
                    name: base.clone(),
                }));
                components = &[];
                on_menu = false;
            }
        }

        let primary = self.state.primary();
        let hoverable = primary.is_empty() || primary == AppState::COMPONENT_HOVERED;
        if hoverable
            && let Some(ItemKind::Component { index }) = components.first().map(|i| &i.kind)
        {
            self.hovered_component = Some(*index);
            self.set_primary(AppState::COMPONENT_HOVERED);
        } else if on_menu {
            self.set_primary(AppState::COMPONENT_MENU_HOVERED);
        } else {
            self.hovered_component = None;
            self.set_primary(AppState::DEFAULT);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn step_select_points(
        &mut self,
        glyph: &ConstructedGlyph,
        hits: &Hits,
        boxed: &[Item],
        pressed: bool,
        released: bool,
        pointer: Point,
        sink: &mut dyn ActionSink,
    ) {
        let state = self.state.primary();

        if state.is_default() && pressed {
            match hits.spacing.first() {
                Some(spacing) => {
                    self.start_drag(AppState::DRAGGING_SPACING, vec![spacing.clone()], glyph, pointer)
                }
                None => self.start_box(pointer),
            }
        } else if state.contains(AppState::BOX_SELECTING) && released {
            self.box_anchor = None;
            if !boxed.is_empty() {
                self.clear_contour();
                self.selection = Selection::from_items(boxed.iter().cloned());
                self.set_primary(AppState::POINTS_SELECTED);
            } else if !hits.contours.is_empty() {
                self.pick_contour(&hits.contours);
                self.set_primary(AppState::CONTOUR_SELECTED);
            } else {
                self.set_primary(AppState::DEFAULT);
            }
        } else if state.contains(AppState::CONTOUR_SELECTED) && pressed {
            if let Some(node) = hits.nodes.first() {
                self.start_drag(AppState::DRAGGING_CONTOUR_POINT, vec![node.clone()], glyph, pointer);
            } else if !hits.contours.is_empty() {
                if self.contour_is_hit(hits) {
                    self.start_drag(AppState::DRAGGING_CONTOUR, Vec::new(), glyph, pointer);
                } else {
                    self.clear_contour();
                    self.start_box(pointer);
                }
            } else if let Some(spacing) = hits.spacing.first() {
                self.start_drag(AppState::DRAGGING_SPACING, vec![spacing.clone()], glyph, pointer);
            } else {
                self.clear_contour();
                self.start_box(pointer);
            }
        } else if state.intersects(AppState::DRAGGING_ANY_POINT | AppState::DRAGGING_SPACING)
            && released
        {
            let next = if state.contains(AppState::DRAGGING_POINTS) {
                AppState::POINTS_SELECTED
            } else {
                match self.selection.iter().next() {
                    Some(item) if item.is_skeleton_node() => AppState::SKELETON_POINT_SELECTED,
                    Some(item) if item.is_spacing() => AppState::SPACING_SELECTED,
                    _ => AppState::CONTOUR_POINT_SELECTED,
                }
            };
            self.drag = None;
            self.set_primary(next);
            sink.dispatch(Action::flush(
                glyph.override_name(),
                settings::drag::MANUAL_EDIT_LABEL,
            ));
        } else if state.contains(AppState::DRAGGING_CONTOUR) && released {
            // A click without motion on overlapping contours picks the next one
            let clicked = self.drag.take().is_some_and(|d| !d.started);
            if clicked && hits.contours.len() > 1 {
                self.pick_contour(&hits.contours);
            }
            self.set_primary(AppState::CONTOUR_SELECTED);
        } else if state.intersects(
            AppState::SINGLE_POINT_SELECTED | AppState::SPACING_SELECTED,
        ) && pressed
        {
            if let Some(node) = hits.nodes.first() {
                self.start_drag(AppState::DRAGGING_CONTOUR_POINT, vec![node.clone()], glyph, pointer);
            } else if !hits.contours.is_empty() && self.contour.is_some() {
                self.selection.clear();
                if self.contour_is_hit(hits) {
                    self.start_drag(AppState::DRAGGING_CONTOUR, Vec::new(), glyph, pointer);
                } else {
                    self.start_box(pointer);
                }
            } else if let Some(spacing) = hits.spacing.first() {
                self.start_drag(AppState::DRAGGING_SPACING, vec![spacing.clone()], glyph, pointer);
            } else {
                self.selection.clear();
                self.start_box(pointer);
            }
        } else if state.contains(AppState::POINTS_SELECTED) && pressed {
            if hits.nodes.iter().any(|n| self.selection.contains(&n.id)) {
                let items: Vec<Item> = self.selection.iter().cloned().collect();
                self.start_drag(AppState::DRAGGING_POINTS, items, glyph, pointer);
            } else {
                self.selection.clear();
                self.start_box(pointer);
            }
        }
    }

    /// Turn this frame's drag or nudge into edits. Returns the guide line of
    /// a direction-locked drag.
    fn apply_interactions(
        &mut self,
        glyph: &ConstructedGlyph,
        input: &InputState,
        sink: &mut dyn ActionSink,
    ) -> Option<GuideLine> {
        let state = self.state;
        let world = self.camera.to_world(input.pointer);
        let mut targets: Vec<(Item, Point)> = Vec::new();
        let mut lock = None;

        if state.intersects(
            AppState::DRAGGING_ANY_POINT | AppState::DRAGGING_CONTOUR | AppState::DRAGGING_SPACING,
        ) {
            let Some(drag) = self.drag.as_ref().filter(|d| d.started) else {
                return None;
            };
            let offset = world - drag.anchor_world;
            if input.modifiers.contains(Modifiers::SHIFT) && drag.lock_frozen {
                lock = Some(drag.lock);
            }
            for (item, start) in &drag.starts {
                let target = if item.is_spacing() { world } else { *start + offset };
                targets.push((item.clone(), target));
            }
        } else if let Some(step) = self.nudge_step(input) {
            if state.nudges_points() {
                for item in self.selection.iter() {
                    if let Some(center) = item.center(glyph) {
                        targets.push((item.clone(), center + step));
                    }
                }
            } else if state.contains(AppState::SPACING_SELECTED)
                && step.x != 0.0
                && let Some(item) = self.selection.single()
                && let ItemKind::Spacing { side } = item.kind
            {
                let base = match side {
                    SpacingSide::Left => 0.0,
                    SpacingSide::Right => glyph.advance_width,
                };
                targets.push((item.clone(), Point::new(base + step.x, 0.0)));
            }
        }

        let modifiers = self.edit_modifiers(input);
        let mut guide = None;
        let mut changes = Changes::new();
        for (item, mut target) in targets {
            if let Some(axis) = lock
                && matches!(
                    item.kind,
                    ItemKind::SkeletonNode { .. } | ItemKind::ContourNode { .. }
                )
                && !modifiers.distribute
                && let Some((_, start)) = self
                    .drag
                    .as_ref()
                    .and_then(|d| d.starts.iter().find(|(i, _)| i.id == item.id))
            {
                match axis {
                    LockAxis::X => target.y = start.y,
                    LockAxis::Y => target.x = start.x,
                }
                guide = Some(GuideLine {
                    axis,
                    through: target,
                });
            }

            match editing::apply_edit(glyph, &item, target, modifiers) {
                Some(Edit::Points(patch)) => changes.extend(patch),
                Some(Edit::Spacing { side, value, letter }) => {
                    sink.dispatch(Action::ChangeLetterSpacing(LetterSpacing {
                        value,
                        side,
                        letter,
                    }));
                    if side == SpacingSide::Left {
                        self.camera.translation.x += target.x * self.camera.zoom;
                    }
                }
                None => {}
            }
        }
        if !changes.is_empty() {
            sink.dispatch(Action::node_changes(glyph.override_name(), changes));
        }
        guide
    }

    fn edit_modifiers(&self, input: &InputState) -> EditModifiers {
        let keys = &self.config.keys;
        let on_curve = if input.is_key_down(keys.angle_only) {
            OnCurveMode::ANGLE
        } else if input.is_key_down(keys.width_only) {
            OnCurveMode::WIDTH
        } else {
            OnCurveMode::all()
        };
        EditModifiers {
            unsmooth: input.modifiers.contains(Modifiers::ALT),
            unparallel: input.modifiers.command(),
            on_curve,
            distribute: input.is_key_down(keys.distribute),
        }
    }

    /// Design-space step for an arrow key pressed this frame
    fn nudge_step(&self, input: &InputState) -> Option<Vec2> {
        let amount = if input.modifiers.contains(Modifiers::SHIFT) {
            self.config.nudge.shift
        } else {
            self.config.nudge.base
        };
        [
            (settings::keys::LEFT, Vec2::new(-1.0, 0.0)),
            (settings::keys::UP, Vec2::new(0.0, 1.0)),
            (settings::keys::RIGHT, Vec2::new(1.0, 0.0)),
            (settings::keys::DOWN, Vec2::new(0.0, -1.0)),
        ]
        .into_iter()
        .find(|(key, _)| input.key_pressed(*key))
        .map(|(_, direction)| direction * amount)
    }

    // ============================================================================
    // HELPERS
    // ============================================================================

    fn set_primary(&mut self, primary: AppState) {
        self.state = self.state.with_primary(primary);
    }

    fn start_box(&mut self, pointer: Point) {
        self.box_anchor = Some(pointer);
        self.set_primary(AppState::BOX_SELECTING);
    }

    fn start_drag(&mut self, state: AppState, items: Vec<Item>, glyph: &ConstructedGlyph, pointer: Point) {
        let starts = items
            .iter()
            .filter_map(|item| item.center(glyph).map(|c| (item.clone(), c)))
            .collect();
        if state != AppState::DRAGGING_CONTOUR {
            self.selection = Selection::from_items(items);
        }
        self.drag = Some(DragState {
            anchor: pointer,
            anchor_world: self.camera.to_world(pointer),
            starts,
            started: false,
            lock: LockAxis::X,
            lock_frozen: false,
        });
        self.set_primary(state);
    }

    /// Start threshold and direction lock, both measured in screen pixels
    fn update_drag(&mut self, pointer: Point) {
        let Some(drag) = &mut self.drag else {
            return;
        };
        let delta = pointer - drag.anchor;
        let displacement = delta.hypot();
        if !drag.started && displacement >= self.config.drag.start_threshold {
            drag.started = true;
        }
        if !drag.lock_frozen {
            drag.lock = if delta.x.abs() > delta.y.abs() {
                LockAxis::X
            } else {
                LockAxis::Y
            };
            drag.lock_frozen = displacement > self.config.drag.directional_threshold;
        }
    }

    fn pick_contour(&mut self, contours: &[Item]) {
        let ids: Vec<PointPath> = contours.iter().map(|c| c.id.clone()).collect();
        if ids != self.contour_hits {
            self.contour_cycle = 0;
            self.contour_hits = ids;
        }
        self.contour = Some(contours[self.contour_cycle % contours.len()].clone());
        self.contour_cycle += 1;
    }

    fn clear_contour(&mut self) {
        self.contour = None;
        self.contour_cycle = 0;
        self.contour_hits.clear();
    }

    fn contour_is_hit(&self, hits: &Hits) -> bool {
        self.contour
            .as_ref()
            .is_some_and(|selected| hits.contours.iter().any(|c| c.id == selected.id))
    }

    fn reset_interaction(&mut self) {
        self.set_primary(AppState::DEFAULT);
        self.selection.clear();
        self.clear_contour();
        self.box_anchor = None;
        self.drag = None;
        self.hovered_component = None;
        // releasing the pan key must not bring back a state that no longer applies
        if let Some((_, saved_state)) = &mut self.pan_saved {
            *saved_state = AppState::DEFAULT;
        }
    }

    fn is_double_click(&mut self, now: Duration) -> bool {
        match self.last_press.take() {
            Some(previous) if now.saturating_sub(previous) < self.config.drag.double_click_window() => {
                true
            }
            _ => {
                self.last_press = Some(now);
                false
            }
        }
    }

    /// Center the glyph's bounding box at the reset zoom
    fn reset_view(&mut self, glyph: &ConstructedGlyph, viewport: Size) {
        let center = glyph.bounding_box().map_or(Point::ZERO, |b| b.center());
        self.camera
            .center_on(center, self.config.camera.reset_zoom, viewport);
        tracing::info!(
            "[InteractionSession] view reset on {} at zoom {}",
            glyph.name,
            self.camera.zoom
        );
    }

    fn publish_visibility(&mut self, glyph: &ConstructedGlyph, viewport: Size, sink: &mut dyn ActionSink) {
        let Some(bounds) = glyph.bounding_box() else {
            return;
        };
        let outside = self.camera.is_outside(bounds, viewport);
        if outside != self.outside_view {
            self.outside_view = outside;
            sink.dispatch(Action::store(StoreValue {
                glyph_outside_view: Some(outside),
                ..Default::default()
            }));
        }
    }
}

impl Drop for InteractionSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Lines from every node the item's node was computed from.
///
/// Anchor references are skipped, and each dependency is drawn from the
/// node that owns it.
fn dependency_links_of(glyph: &ConstructedGlyph, item: &Item) -> Vec<DependencyLink> {
    let Some(to) = item.center(glyph) else {
        return Vec::new();
    };
    let key = item.id.node_prefix().unwrap_or_else(|| item.id.clone());
    let mut seen = BTreeSet::new();
    glyph
        .dependencies_of(&key)
        .into_iter()
        .filter(|dep| !dep.to_string().contains("anchor"))
        .filter_map(|dep| dep.node_prefix())
        .filter(|node| *node != key && seen.insert(node.clone()))
        .filter_map(|node| {
            glyph.on_curve(&node).map(|p| DependencyLink {
                from_id: node,
                from: p.point,
                to,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::NodeChanges;
    use crate::model::glyph::Contour;
    use crate::model::glyph::tests::{glyph_with, node_at};

    struct ScriptedHits {
        hot: Vec<Item>,
        boxed: Vec<Item>,
    }

    impl HitTester for ScriptedHits {
        fn hot_items(&self, _: &ConstructedGlyph, _: &Camera, _: Point) -> Vec<Item> {
            self.hot.clone()
        }

        fn box_items(&self, _: &ConstructedGlyph, _: &Camera, _: Point, _: Point) -> Vec<Item> {
            self.boxed.clone()
        }
    }

    struct Harness {
        session: InteractionSession,
        input: InputState,
        hits: ScriptedHits,
        actions: Vec<Action>,
    }

    fn glyph() -> ConstructedGlyph {
        glyph_with(vec![Contour {
            skeleton: false,
            closed: true,
            nodes: vec![
                node_at(100.0, 100.0),
                node_at(200.0, 100.0),
                node_at(150.0, 300.0),
            ],
        }])
    }

    /// After the first frame the view is fitted: zoom 0.5, glyph center
    /// (150, 200) at screen (400, 300), so node 0 is at screen (375, 350).
    const NODE_0: Point = Point::new(375.0, 350.0);

    impl Harness {
        fn new(mode: CanvasMode) -> Self {
            let mut session = InteractionSession::new(EditorConfig::default());
            session.set_glyph(Some(glyph()));
            session.set_ui(UiSnapshot {
                canvas_mode: mode,
                ..Default::default()
            });
            let mut harness = Harness {
                session,
                input: InputState::new(Size::new(800.0, 600.0)),
                hits: ScriptedHits {
                    hot: Vec::new(),
                    boxed: Vec::new(),
                },
                actions: Vec::new(),
            };
            harness.frame();
            harness.actions.clear();
            harness
        }

        fn frame(&mut self) -> FrameOutput {
            self.input.advance(Duration::from_millis(16));
            self.session
                .step(&mut self.input, &self.hits, &mut self.actions)
        }

        fn press(&mut self, at: Point) -> FrameOutput {
            // far from the previous press, so never a double click
            self.input.advance(Duration::from_secs(1));
            self.input.pointer_move(at);
            self.input.pointer_press();
            self.frame()
        }

        fn release(&mut self) -> FrameOutput {
            self.input.pointer_release();
            self.frame()
        }

        fn move_to(&mut self, at: Point) -> FrameOutput {
            self.input.pointer_move(at);
            self.frame()
        }

        fn key(&mut self, code: u32) -> FrameOutput {
            self.input.key_down(code);
            let out = self.frame();
            self.input.key_up(code);
            self.frame();
            out
        }

        fn node(&self, index: usize) -> Item {
            let glyph = self.session.glyph().unwrap();
            Item::point(glyph, &PointPath::node(0, index)).unwrap()
        }

        fn spacing(&self, side: SpacingSide) -> Item {
            Item::spacing(self.session.glyph().unwrap(), side)
        }

        fn node_changes(&self) -> Vec<&NodeChanges> {
            self.actions
                .iter()
                .filter_map(|a| match a {
                    Action::ChangeGlyphNodeManually(c) => Some(c),
                    _ => None,
                })
                .collect()
        }

        /// Box select with a contour under the pointer, then grab node 0
        fn select_contour_then_grab_node(&mut self) {
            self.hits.hot = vec![Item::contour(0)];
            self.press(NODE_0);
            self.release();
            assert_eq!(self.session.state(), AppState::CONTOUR_SELECTED);
            self.hits.hot = vec![self.node(0), Item::contour(0)];
            self.press(NODE_0);
            assert_eq!(self.session.state(), AppState::DRAGGING_CONTOUR_POINT);
        }

        fn select_points(&mut self) {
            self.hits.boxed = vec![self.node(0), self.node(1)];
            self.press(Point::new(10.0, 10.0));
            self.release();
            self.hits.boxed.clear();
            assert_eq!(self.session.state(), AppState::POINTS_SELECTED);
        }
    }

    #[test]
    fn first_frame_fits_the_glyph() {
        let harness = Harness::new(CanvasMode::SelectPoints);
        let camera = harness.session.camera();
        assert_eq!(camera.zoom, 0.5);
        assert_eq!(camera.to_screen(Point::new(100.0, 100.0)), NODE_0);
    }

    #[test]
    fn press_on_nothing_box_selects() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        let out = h.press(Point::new(10.0, 20.0));
        assert_eq!(out.state, AppState::BOX_SELECTING);
        h.move_to(Point::new(60.0, 80.0));
        let out = h.frame();
        assert!(out.box_rect.is_some());

        let out = h.release();
        assert_eq!(out.state, AppState::DEFAULT);
        assert!(out.box_rect.is_none());
        assert!(h.node_changes().is_empty());
    }

    #[test]
    fn box_release_selects_points() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.select_points();
        assert_eq!(h.session.selection().len(), 2);
        let published = h.actions.iter().any(|a| {
            matches!(a, Action::StoreValue(StoreValue { selected_items: Some(items), .. }) if items.len() == 2)
        });
        assert!(published);
    }

    #[test]
    fn drag_waits_for_threshold() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.select_contour_then_grab_node();

        h.move_to(NODE_0 + Vec2::new(5.0, 0.0));
        assert!(h.node_changes().is_empty());

        h.move_to(NODE_0 + Vec2::new(6.0, 0.0));
        let changes = h.node_changes();
        assert_eq!(changes.len(), 1);
        let x = PointPath::node(0, 0).child("x");
        assert_eq!(changes[0].changes.get(&x), Some(&12.0));
        assert_eq!(changes[0].glyph_name, "a");

        h.actions.clear();
        let out = h.release();
        assert_eq!(out.state, AppState::CONTOUR_POINT_SELECTED);
        assert_eq!(h.actions[0], Action::flush("a", "manual edition"));
    }

    #[test]
    fn shift_locks_the_drag_axis() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.select_contour_then_grab_node();
        h.input.modifiers = Modifiers::SHIFT;
        let out = h.move_to(NODE_0 + Vec2::new(20.0, -4.0));
        let last = h.node_changes().pop().unwrap().clone();
        assert_eq!(last.changes.get(&PointPath::node(0, 0).child("y")), Some(&0.0));
        assert_eq!(last.changes.get(&PointPath::node(0, 0).child("x")), Some(&40.0));
        assert_eq!(out.guide.map(|g| g.axis), Some(LockAxis::X));
    }

    #[test]
    fn clicking_the_selected_contour_cycles_overlaps() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.hits.hot = vec![Item::contour(0), Item::contour(1)];
        h.press(NODE_0);
        let out = h.release();
        assert_eq!(out.selected_contour.map(|c| c.id), Some(PointPath::contour(0)));

        h.press(NODE_0);
        assert_eq!(h.session.state(), AppState::DRAGGING_CONTOUR);
        let out = h.release();
        assert_eq!(out.state, AppState::CONTOUR_SELECTED);
        assert_eq!(out.selected_contour.map(|c| c.id), Some(PointPath::contour(1)));
    }

    #[test]
    fn double_click_resets_view_and_is_consumed() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.press(Point::new(10.0, 10.0));
        h.release();
        h.input.scroll(500.0);
        h.frame();
        assert!(h.session.camera().zoom > 0.5);

        h.input.pointer_press();
        let out = h.frame();
        assert_eq!(out.state, AppState::DEFAULT);
        assert_eq!(out.camera.zoom, 0.5);
    }

    #[test]
    fn pan_key_restores_mode_and_state() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.select_points();
        h.actions.clear();

        h.input.key_down(settings::keys::PAN);
        let out = h.frame();
        assert_eq!(out.mode, CanvasMode::Move);
        assert!(h.actions.contains(&Action::store(StoreValue {
            canvas_mode: Some(CanvasMode::Move),
            ..Default::default()
        })));

        let before = h.session.camera().translation;
        let at = h.input.pointer;
        h.press(at);
        h.move_to(at + Vec2::new(30.0, 10.0));
        assert_eq!(h.session.camera().translation, before + Vec2::new(30.0, 10.0));
        h.release();

        h.input.key_up(settings::keys::PAN);
        let out = h.frame();
        assert_eq!(out.mode, CanvasMode::SelectPoints);
        assert_eq!(out.state, AppState::POINTS_SELECTED);
        assert_eq!(h.session.selection().len(), 2);
    }

    #[test]
    fn escape_resets_selected_points() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.select_points();
        h.key(settings::keys::ESCAPE);
        let reset = h.actions.iter().find_map(|a| match a {
            Action::ResetGlyphPointsManually(r) => Some(r),
            _ => None,
        });
        let reset = reset.expect("reset action");
        assert_eq!(reset.glyph_name, "a");
        assert_eq!(reset.points.len(), 2);
        assert_eq!(reset.points[0].kind, "contour-node");
    }

    #[test]
    fn arrow_keys_nudge_selection() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.select_points();
        h.input.modifiers = Modifiers::SHIFT;
        h.key(settings::keys::UP);
        let changes = h.node_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].changes.get(&PointPath::node(0, 1).child("y")), Some(&10.0));
        assert_eq!(changes[0].changes.get(&PointPath::node(0, 0).child("x")), Some(&0.0));
    }

    #[test]
    fn glyph_change_forces_default() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.select_points();
        let mut other = glyph();
        other.name = "b".to_string();
        h.session.set_glyph(Some(other));
        let out = h.frame();
        assert_eq!(out.state, AppState::DEFAULT);
        assert!(out.selection.is_empty());
    }

    #[test]
    fn glyph_change_during_pan_restores_default() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.select_points();

        h.input.key_down(settings::keys::PAN);
        assert_eq!(h.frame().mode, CanvasMode::Move);

        let mut other = glyph();
        other.name = "b".to_string();
        h.session.set_glyph(Some(other));
        h.frame();

        h.input.key_up(settings::keys::PAN);
        let out = h.frame();
        assert_eq!(out.mode, CanvasMode::SelectPoints);
        assert_eq!(out.state, AppState::DEFAULT);
        assert!(out.selection.is_empty());
    }

    #[test]
    fn wheel_sets_zooming_while_it_moves() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.input.scroll(500.0);
        let out = h.frame();
        assert!(out.state.contains(AppState::ZOOMING));
        assert_eq!(out.state.primary(), AppState::DEFAULT);

        let out = h.frame();
        assert!(!out.state.contains(AppState::ZOOMING));
        assert_eq!(out.state, AppState::DEFAULT);
    }

    #[test]
    fn spacing_drag_sends_letter_spacing() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        let right = h.spacing(SpacingSide::Right);
        h.hits.hot = vec![right.clone()];
        let out = h.frame();
        assert_eq!(out.cursor, CursorHint::EwResize);

        let at = h.session.camera().to_screen(Point::new(500.0, 0.0));
        h.press(at);
        assert_eq!(h.session.state(), AppState::DRAGGING_SPACING);
        h.move_to(at + Vec2::new(10.0, 0.0));
        let spacing = h.actions.iter().find_map(|a| match a {
            Action::ChangeLetterSpacing(s) => Some(s.clone()),
            _ => None,
        });
        assert_eq!(
            spacing,
            Some(LetterSpacing {
                value: 20.0,
                side: SpacingSide::Right,
                letter: 'a',
            })
        );
        let out = h.release();
        assert_eq!(out.state, AppState::SPACING_SELECTED);
    }

    #[test]
    fn components_mode_menu() {
        let mut h = Harness::new(CanvasMode::Components);
        h.hits.hot = vec![Item::component(0)];
        let out = h.frame();
        assert_eq!(out.state, AppState::COMPONENT_HOVERED);
        assert_eq!(out.component_menu, Some(0));

        h.hits.hot = vec![Item::component_choice(0, "bowl", "bowl-round")];
        let out = h.frame();
        assert_eq!(out.state, AppState::COMPONENT_MENU_HOVERED);
        h.input.pointer_press();
        h.frame();
        h.release();
        assert!(h.actions.contains(&Action::ChangeComponent(ComponentChange {
            glyph: "a".to_string(),
            id: "bowl".to_string(),
            name: "bowl-round".to_string(),
        })));

        h.hits.hot.clear();
        let out = h.frame();
        assert_eq!(out.state, AppState::DEFAULT);
        assert_eq!(out.component_menu, None);
    }

    #[test]
    fn dependency_links_for_single_selection() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        let mut g = glyph();
        g.dependency_tree
            .record(PointPath::node(0, 1), "x", PointPath::node(0, 0).child("x"));
        g.dependency_tree
            .record(PointPath::node(0, 1), "y", "anchors.0.y".parse().unwrap());
        h.session.set_glyph(Some(g));
        h.session.set_ui(UiSnapshot {
            canvas_mode: CanvasMode::SelectPoints,
            dependencies: true,
            ..Default::default()
        });

        h.hits.hot = vec![Item::contour(0)];
        h.press(NODE_0);
        h.release();
        h.hits.hot = vec![h.node(1)];
        h.press(NODE_0);
        let out = h.release();
        assert_eq!(out.state, AppState::CONTOUR_POINT_SELECTED);
        assert_eq!(
            out.dependency_links,
            vec![DependencyLink {
                from_id: PointPath::node(0, 0),
                from: Point::new(100.0, 100.0),
                to: Point::new(200.0, 100.0),
            }]
        );
    }

    #[test]
    fn teardown_stops_everything() {
        let mut h = Harness::new(CanvasMode::SelectPoints);
        h.session.teardown();
        let out = h.press(Point::new(10.0, 10.0));
        assert_eq!(out.state, AppState::DEFAULT);
        assert!(h.actions.is_empty());
        assert!(!h.input.pointer_pressed);
    }
}
