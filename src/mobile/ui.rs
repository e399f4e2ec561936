//! egui rendering surface for the touch layer.
//!
//! ┌─────────────────────────┐
//! │     ( Copied to … )      │  ← toast pill, fades and slides in
//! │   ↓ Release to refresh   │  ← pull indicator above the list
//! │ ┌─────────────────────┐ │
//! │ │ row ◀── offset ──    │ │  ← swipe row, translated by its offset
//! │ └─────────────────────┘ │
//! └─────────────────────────┘
//!
//! The state machines stay egui-free; this module only reads their
//! snapshots and paints them, and turns egui input into pointer signals.

use egui::{Align2, Color32, Event, FontId, Id, Order, Pos2, Rect, RichText, Sense, TouchPhase, Ui, Vec2};

use super::feedback::{FeedbackDispatcher, OverlayView, ToastView};
use super::pull::PullIndicator;

/// Distance from the top of the screen to the toast.
const TOAST_TOP: f32 = 60.0;
/// How far the toast slides while fading.
const TOAST_SLIDE: f32 = 20.0;

/// Pointer input reduced to what the recognizers consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerSignal {
    Down(Pos2),
    Move(Pos2),
    Up(Pos2),
    Cancel,
}

/// Pointer signals for this frame, in delivery order.
pub fn pointer_signals(ctx: &egui::Context) -> Vec<PointerSignal> {
    ctx.input(|i| signals_from_events(&i.events))
}

fn signals_from_events(events: &[Event]) -> Vec<PointerSignal> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed,
                ..
            } => Some(if *pressed {
                PointerSignal::Down(*pos)
            } else {
                PointerSignal::Up(*pos)
            }),
            Event::PointerMoved(pos) => Some(PointerSignal::Move(*pos)),
            Event::PointerGone => Some(PointerSignal::Cancel),
            Event::Touch {
                phase: TouchPhase::Cancel,
                ..
            } => Some(PointerSignal::Cancel),
            _ => None,
        })
        .collect()
}

fn alpha(opacity: f32) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Paint whatever toast and overlay the dispatcher currently shows.
pub fn render_feedback(ctx: &egui::Context, feedback: &FeedbackDispatcher) {
    let mut animating = false;
    if let Some(toast) = feedback.visible_toast() {
        render_toast(ctx, &toast);
        animating = true;
    }
    if let Some(overlay) = feedback.active_overlay() {
        render_overlay(ctx, &overlay);
        animating = true;
    }
    if animating {
        ctx.request_repaint();
    }
}

pub fn render_toast(ctx: &egui::Context, toast: &ToastView) {
    let a = alpha(toast.opacity);
    let slide = (1.0 - toast.opacity.clamp(0.0, 1.0)) * TOAST_SLIDE;

    egui::Area::new(Id::new("contextos_toast"))
        .order(Order::Tooltip)
        .anchor(Align2::CENTER_TOP, Vec2::new(0.0, TOAST_TOP - slide))
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(Color32::from_black_alpha((a as f32 * 0.8) as u8))
                .rounding(20.0)
                .inner_margin(egui::Margin::symmetric(20.0, 12.0))
                .show(ui, |ui| {
                    ui.label(
                        RichText::new(&toast.message)
                            .size(15.0)
                            .strong()
                            .color(Color32::from_white_alpha(a)),
                    );
                });
        });
}

/// Full-screen activity overlay. Eats every click and drag while blocking.
pub fn render_overlay(ctx: &egui::Context, overlay: &OverlayView) {
    let screen = ctx.screen_rect();
    let a = alpha(overlay.opacity);

    egui::Area::new(Id::new("contextos_overlay"))
        .order(Order::Foreground)
        .fixed_pos(screen.min)
        .interactable(overlay.blocking)
        .show(ctx, |ui| {
            let sense = if overlay.blocking {
                Sense::click_and_drag()
            } else {
                Sense::hover()
            };
            let (rect, _) = ui.allocate_exact_size(screen.size(), sense);
            let painter = ui.painter();
            painter.rect_filled(rect, 0.0, Color32::from_black_alpha((a as f32 * 0.3) as u8));

            let card = Rect::from_center_size(rect.center(), Vec2::new(200.0, 110.0));
            painter.rect_filled(card, 16.0, Color32::from_white_alpha((a as f32 * 0.9) as u8));

            let builder = egui::UiBuilder::new().max_rect(card.shrink(24.0));
            ui.allocate_new_ui(builder, |ui| {
                ui.vertical_centered(|ui| {
                    ui.spinner();
                    ui.add_space(12.0);
                    ui.label(
                        RichText::new(&overlay.message)
                            .size(15.0)
                            .color(Color32::from_rgba_unmultiplied(51, 51, 51, a)),
                    );
                });
            });
        });
}

/// Indicator strip above the pull region. Height follows the pull offset.
pub fn render_pull_indicator(ui: &mut Ui, indicator: &PullIndicator) {
    if indicator.offset <= 0.0 {
        return;
    }
    let (rect, _) = ui.allocate_exact_size(
        Vec2::new(ui.available_width(), indicator.offset),
        Sense::hover(),
    );
    ui.painter().text(
        rect.center(),
        Align2::CENTER_CENTER,
        indicator.label,
        FontId::proportional(14.0),
        Color32::from_rgba_unmultiplied(142, 142, 147, alpha(indicator.opacity)),
    );
}

/// Lay out one swipeable row. Returns the row's resting rect (for hit tests)
/// and whatever `add_contents` returned.
pub fn swipe_row<R>(
    ui: &mut Ui,
    height: f32,
    offset: f32,
    add_contents: impl FnOnce(&mut Ui) -> R,
) -> (Rect, R) {
    let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), height), Sense::hover());
    if offset != 0.0 {
        ui.painter()
            .rect_filled(rect, 8.0, ui.visuals().faint_bg_color);
    }
    let moved = rect.translate(Vec2::new(offset, 0.0));
    let builder = egui::UiBuilder::new().max_rect(moved);
    let inner = ui.allocate_new_ui(builder, add_contents).inner;
    (rect, inner)
}
