use eframe::egui;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::mpsc;

use contextos_mobile::mobile::ui::{self as touch_ui, PointerSignal};
use contextos_mobile::mobile::{
    CallbackError, ElementId, FeedbackDispatcher, HapticKind, OverlayHandle, Platform, PlatformError,
    PullConfig, PullState, PullToRefreshController, ReloadTicket, SharePayload, SwipeActionController,
    SwipeActions, SwipeConfig, SystemClock,
};
use contextos_mobile::net::api::{ApiClient, PromptSummary};

const DEFAULT_API: &str = "http://localhost:8001";
const LIST_REGION: ElementId = ElementId(0);
const ROW_HEIGHT: f32 = 72.0;

/// Desktop stand-in for the native primitives: clipboard only.
struct DesktopPlatform {
    ctx: egui::Context,
}

impl Platform for DesktopPlatform {
    fn write_clipboard(&self, text: &str) -> Result<(), PlatformError> {
        self.ctx.copy_text(text.to_string());
        Ok(())
    }
}

/// Results coming back from worker threads
enum HostEvent {
    Prompts(Vec<PromptSummary>),
    LoadFailed(String),
    Deleted { id: String, result: Result<(), String> },
}

/// Work queued by swipe handlers, run after pointer routing.
enum RowAction {
    Delete(String),
}

const CONFIRM_DELETE: &str = "Are you sure you want to delete this prompt?";

/// A swiped delete waiting on the confirm window.
#[derive(Default)]
struct DeleteGate {
    pending: Option<String>,
}

impl DeleteGate {
    fn request(&mut self, feedback: &FeedbackDispatcher, id: String) {
        feedback.haptic(HapticKind::Warning);
        self.pending = Some(id);
    }

    fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Close the gate. Returns the prompt to delete when confirmed.
    fn resolve(&mut self, feedback: &FeedbackDispatcher, confirmed: bool) -> Option<String> {
        let id = self.pending.take()?;
        if confirmed {
            feedback.haptic(HapticKind::Medium);
            Some(id)
        } else {
            feedback.haptic(HapticKind::Light);
            None
        }
    }
}

fn copy_prompt(feedback: &FeedbackDispatcher, text: &str) -> bool {
    feedback.haptic(HapticKind::Light);
    feedback.copy_to_clipboard(text)
}

fn load_prompts(api: &ApiClient, tx: &mpsc::Sender<HostEvent>) -> Result<(), CallbackError> {
    match api.list_prompts() {
        Ok(prompts) => {
            let _ = tx.send(HostEvent::Prompts(prompts));
            Ok(())
        }
        Err(e) => Err(CallbackError::new(e.to_string())),
    }
}

fn main() {
    env_logger::init();

    let base = std::env::var("CONTEXTOS_API").unwrap_or_else(|_| DEFAULT_API.to_string());
    let session = std::env::var("CONTEXTOS_SESSION").ok();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([420.0, 820.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        "ContextOS",
        options,
        Box::new(move |cc| Ok(Box::new(DeckApp::new(cc.egui_ctx.clone(), &base, session)?))),
    );
    if let Err(e) = result {
        log::error!("ContextOS exited: {}", e);
    }
}

struct DeckApp {
    ctx: egui::Context,
    api: ApiClient,
    feedback: Rc<FeedbackDispatcher>,
    pull: PullToRefreshController,
    swipe: SwipeActionController,
    prompts: Vec<PromptSummary>,
    // Row identity and last frame's hit rects
    row_ids: HashMap<String, ElementId>,
    next_row: u64,
    row_rects: Vec<(ElementId, egui::Rect)>,
    list_rect: egui::Rect,
    scroll_offset: f32,
    active_row: Option<ElementId>,
    events_tx: mpsc::Sender<HostEvent>,
    events_rx: mpsc::Receiver<HostEvent>,
    actions: Rc<RefCell<Vec<RowAction>>>,
    delete_gate: DeleteGate,
    busy: Option<OverlayHandle>,
}

impl DeckApp {
    fn new(
        ctx: egui::Context,
        base: &str,
        session: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let api = ApiClient::new(base, session)?;
        let platform = Rc::new(DesktopPlatform { ctx: ctx.clone() });
        let feedback = Rc::new(FeedbackDispatcher::new(platform, Rc::new(SystemClock)));
        log::info!(
            "API {} / capabilities {:?}",
            api.base(),
            feedback.capabilities()
        );

        let (events_tx, events_rx) = mpsc::channel();

        let reload = {
            let (api, tx, ctx) = (api.clone(), events_tx.clone(), ctx.clone());
            move || {
                let (done, ticket) = ReloadTicket::pending();
                let (api, tx, ctx) = (api.clone(), tx.clone(), ctx.clone());
                std::thread::spawn(move || {
                    done.complete(load_prompts(&api, &tx));
                    ctx.request_repaint();
                });
                ticket
            }
        };
        let pull = PullToRefreshController::new(LIST_REGION, PullConfig::default(), feedback.clone(), reload)?;
        let swipe = SwipeActionController::new(SwipeConfig::default(), feedback.clone())?;

        let mut app = Self {
            ctx,
            api,
            feedback,
            pull,
            swipe,
            prompts: Vec::new(),
            row_ids: HashMap::new(),
            next_row: 1,
            row_rects: Vec::new(),
            list_rect: egui::Rect::NOTHING,
            scroll_offset: 0.0,
            active_row: None,
            events_tx,
            events_rx,
            actions: Rc::new(RefCell::new(Vec::new())),
            delete_gate: DeleteGate::default(),
            busy: None,
        };
        app.initial_load();
        Ok(app)
    }

    fn initial_load(&mut self) {
        self.busy = Some(self.feedback.overlay("Loading prompts..."));
        let (api, tx, ctx) = (self.api.clone(), self.events_tx.clone(), self.ctx.clone());
        std::thread::spawn(move || {
            if let Err(e) = load_prompts(&api, &tx) {
                let _ = tx.send(HostEvent::LoadFailed(e.message));
            }
            ctx.request_repaint();
        });
    }

    fn hide_busy(&mut self) {
        if let Some(handle) = self.busy.take() {
            handle.hide();
        }
    }

    fn row_id(&mut self, prompt_id: &str) -> ElementId {
        if let Some(id) = self.row_ids.get(prompt_id) {
            return *id;
        }
        let id = ElementId(self.next_row);
        self.next_row += 1;
        self.row_ids.insert(prompt_id.to_string(), id);
        id
    }

    fn set_prompts(&mut self, prompts: Vec<PromptSummary>) {
        let stale: Vec<String> = self
            .row_ids
            .keys()
            .filter(|k| !prompts.iter().any(|p| &p.id == *k))
            .cloned()
            .collect();
        for key in stale {
            if let Some(row) = self.row_ids.remove(&key) {
                self.swipe.unbind(row);
            }
        }

        for prompt in &prompts {
            let row = self.row_id(&prompt.id);
            if self.swipe.is_bound(row) {
                continue;
            }
            let delete = {
                let (queue, id) = (self.actions.clone(), prompt.id.clone());
                move || {
                    queue.borrow_mut().push(RowAction::Delete(id.clone()));
                    Ok(())
                }
            };
            let share = {
                let feedback = self.feedback.clone();
                let payload = SharePayload::new(
                    prompt.title.clone(),
                    prompt.content.clone(),
                    self.api.prompt_link(&prompt.id),
                );
                move || {
                    if feedback.share(&payload) {
                        feedback.toast("Prompt shared successfully!");
                    }
                    Ok(())
                }
            };
            self.swipe
                .bind(row, SwipeActions::new().on_left(delete).on_right(share));
        }
        self.prompts = prompts;
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                HostEvent::Prompts(prompts) => {
                    log::debug!("loaded {} prompts", prompts.len());
                    self.hide_busy();
                    self.set_prompts(prompts);
                }
                HostEvent::LoadFailed(message) => {
                    self.hide_busy();
                    self.feedback.report(
                        &Err(CallbackError::new(message)),
                        None,
                        "Error loading data",
                    );
                }
                HostEvent::Deleted { id, result } => {
                    self.hide_busy();
                    let result = result.map_err(CallbackError::new);
                    if result.is_ok() {
                        self.prompts.retain(|p| p.id != id);
                        if let Some(row) = self.row_ids.remove(&id) {
                            self.swipe.unbind(row);
                        }
                    }
                    self.feedback.report(
                        &result,
                        Some("Prompt deleted successfully!"),
                        "Error deleting prompt",
                    );
                }
            }
        }
    }

    fn run_row_actions(&mut self) {
        let queued: Vec<RowAction> = self.actions.borrow_mut().drain(..).collect();
        for action in queued {
            match action {
                RowAction::Delete(id) => self.delete_gate.request(&self.feedback, id),
            }
        }
    }

    fn start_delete(&mut self, id: String) {
        self.busy = Some(self.feedback.overlay("Deleting prompt..."));
        let (api, tx, ctx) = (self.api.clone(), self.events_tx.clone(), self.ctx.clone());
        std::thread::spawn(move || {
            let result = api.delete_prompt(&id).map_err(|e| e.to_string());
            let _ = tx.send(HostEvent::Deleted { id, result });
            ctx.request_repaint();
        });
    }

    /// Pointer routing stays off while this window is open.
    fn confirm_delete(&mut self, ctx: &egui::Context) {
        if !self.delete_gate.is_open() {
            return;
        }
        let mut answer: Option<bool> = None;
        egui::Window::new("Delete prompt")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(CONFIRM_DELETE);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        answer = Some(false);
                    }
                    if ui
                        .button(egui::RichText::new("Delete").color(egui::Color32::RED))
                        .clicked()
                    {
                        answer = Some(true);
                    }
                });
            });

        if let Some(confirmed) = answer {
            if let Some(id) = self.delete_gate.resolve(&self.feedback, confirmed) {
                self.start_delete(id);
            }
        }
    }

    fn route_pointer(&mut self, ctx: &egui::Context) {
        let blocked = self.delete_gate.is_open()
            || self
                .feedback
                .active_overlay()
                .is_some_and(|overlay| overlay.blocking);
        let now = self.feedback.now();

        for signal in touch_ui::pointer_signals(ctx) {
            match signal {
                PointerSignal::Down(pos) => {
                    if blocked || !self.list_rect.contains(pos) {
                        continue;
                    }
                    self.pull.pointer_down(pos.x, pos.y, now, self.scroll_offset);
                    self.active_row = self
                        .row_rects
                        .iter()
                        .find(|(_, rect)| rect.contains(pos))
                        .map(|(row, _)| *row);
                    if let Some(row) = self.active_row {
                        self.feedback.haptic(HapticKind::Light);
                        self.swipe.pointer_down(row, pos.x, pos.y, now);
                    }
                }
                PointerSignal::Move(pos) => {
                    self.pull.pointer_move(pos.x, pos.y, now);
                    if let Some(row) = self.active_row {
                        self.swipe.pointer_move(row, pos.x, pos.y, now);
                    }
                }
                PointerSignal::Up(pos) => {
                    self.pull.pointer_move(pos.x, pos.y, now);
                    self.pull.pointer_up();
                    if let Some(row) = self.active_row.take() {
                        self.swipe.pointer_move(row, pos.x, pos.y, now);
                        self.swipe.pointer_up(row);
                    }
                }
                PointerSignal::Cancel => {
                    self.pull.pointer_cancel();
                    if let Some(row) = self.active_row.take() {
                        self.swipe.pointer_cancel(row);
                    }
                }
            }
        }
    }
}

impl eframe::App for DeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.route_pointer(ctx);
        self.run_row_actions();
        if self.pull.poll() != PullState::Idle || self.active_row.is_some() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.heading("ContextOS");
            ui.label(
                egui::RichText::new(format!("{} prompts", self.prompts.len()))
                    .size(12.0)
                    .color(egui::Color32::GRAY),
            );
            ui.add_space(6.0);
        });

        let mut copy_text: Option<String> = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            touch_ui::render_pull_indicator(ui, &self.pull.indicator());

            let output = egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let mut rects = Vec::with_capacity(self.prompts.len());
                    for prompt in &self.prompts {
                        let Some(row) = self.row_ids.get(&prompt.id).copied() else {
                            continue;
                        };
                        let offset = self.swipe.offset(row);
                        let (rect, copy) = touch_ui::swipe_row(ui, ROW_HEIGHT, offset, |ui| {
                            egui::Frame::group(ui.style())
                                .show(ui, |ui| {
                                    ui.horizontal(|ui| {
                                        ui.label(egui::RichText::new(&prompt.title).strong());
                                        ui.with_layout(
                                            egui::Layout::right_to_left(egui::Align::Center),
                                            |ui| ui.small_button("Copy").clicked(),
                                        )
                                        .inner
                                    })
                                    .inner
                                })
                                .inner
                        });
                        if copy {
                            copy_text = Some(prompt.content.clone());
                        }
                        rects.push((row, rect));
                        ui.add_space(4.0);
                    }
                    rects
                });

            self.scroll_offset = output.state.offset.y;
            self.list_rect = output.inner_rect;
            self.row_rects = output.inner;
        });

        if let Some(text) = copy_text {
            copy_prompt(&self.feedback, &text);
        }

        self.confirm_delete(ctx);

        touch_ui::render_feedback(ctx, &self.feedback);
    }
}
