//! Single-page fortune card UI: hero screen, animated card reveal, share /
//! download plumbing.
//!
//! Everything here is presentation. The dataset is normalized once at
//! startup via [`crate::predictions`], held in the app state for the page
//! session, and drawn from on each button tap. The current prediction id is
//! mirrored into the `?p=` query parameter so a card can be deep-linked;
//! threading of the "previous id" between draws happens here, not in the
//! selection code.
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlAnchorElement, HtmlCanvasElement, ShareData,
    UrlSearchParams, Window, console, window,
};

use crate::predictions::{self, Prediction};

const CANVAS_W: u32 = 640;
const CANVAS_H: u32 = 800;

const HERO_TITLE: &str = "Твоє передбачення на 2026";
const HERO_SUBTITLE: &str = "Відкрий магію нового року. Що принесе тобі цей час?";
const CARD_CAPTION: &str = "Твоє передбачення на 2026 рік✨";
const DOWNLOAD_NAME: &str = "peredbachennia-2026.png";

const SERIF_STACK: &str = "'Playfair Display', Georgia, serif";
const QUERY_PARAM: &str = "p";

// Word reveal pacing (ms), mirroring the staggered fade of the card text.
const REVEAL_DELAY_MS: f64 = 300.0;
const WORD_STAGGER_MS: f64 = 50.0;
const WORD_FADE_MS: f64 = 300.0;
const TOAST_MS: f64 = 2000.0;

// --- Background Bokeh -------------------------------------------------------

/// One drifting translucent circle of the backdrop. Positions are percent of
/// the canvas; `phase_ms` offsets the drift so the circles never sync up.
#[derive(Clone, Copy)]
struct Bokeh {
    x_pct: f64,
    y_pct: f64,
    radius: f64,
    phase_ms: f64,
    period_ms: f64,
}

const BOKEH: [Bokeh; 4] = [
    Bokeh { x_pct: 0.10, y_pct: 0.20, radius: 150.0, phase_ms: 0.0, period_ms: 25_000.0 },
    Bokeh { x_pct: 0.80, y_pct: 0.60, radius: 125.0, phase_ms: 5_000.0, period_ms: 30_000.0 },
    Bokeh { x_pct: 0.50, y_pct: 0.80, radius: 140.0, phase_ms: 10_000.0, period_ms: 20_000.0 },
    Bokeh { x_pct: 0.20, y_pct: 0.70, radius: 100.0, phase_ms: 15_000.0, period_ms: 35_000.0 },
];

// --- App State ---------------------------------------------------------------

enum Phase {
    /// Landing screen with title + draw button, no card yet.
    Hero,
    /// A prediction is showing (drawn or deep-linked).
    Card,
}

struct AppState {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    predictions: Vec<Prediction>,
    current: Option<Prediction>,
    previous_id: Option<i64>,
    phase: Phase,
    /// Timestamp the current phase (hero fade-in or card reveal) began.
    phase_start_ms: f64,
    /// While `now` is below this, the "Готово!" toast is visible.
    toast_until_ms: f64,
}

thread_local! {
    static APP_STATE: std::cell::RefCell<Option<AppState>> = std::cell::RefCell::new(None);
}

type FrameCallback = std::rc::Rc<std::cell::RefCell<Option<Closure<dyn FnMut(f64)>>>>;

// --- Bootstrap ---------------------------------------------------------------

#[wasm_bindgen]
pub fn start_app() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // Normalize the bundled dataset once; on failure log and show a terminal
    // error overlay instead of crashing (a retry cannot fix static data).
    let predictions = match predictions::normalize_str(crate::PREDICTIONS_JSON) {
        Ok(list) => list,
        Err(err) => {
            console::error_1(&JsValue::from_str(&format!(
                "failed to load predictions: {err}"
            )));
            show_error_overlay(&doc)?;
            return Ok(());
        }
    };

    // Create / reuse the page canvas.
    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id("fc-canvas") {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id("fc-canvas");
        c.set_width(CANVAS_W);
        c.set_height(CANVAS_H);
        c.set_attribute("style", "position:fixed; left:50%; top:46%; transform:translate(-50%,-50%); max-width:96vw; max-height:86vh; border-radius:18px; z-index:10;").ok();
        doc.body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&c)?;
        c
    };
    let ctx: CanvasRenderingContext2d = canvas.get_context("2d")?.unwrap().dyn_into()?;
    ctx.set_text_align("center");

    let now = win.performance().map(|p| p.now()).unwrap_or(0.0);
    let mut state = AppState {
        canvas,
        ctx,
        predictions,
        current: None,
        previous_id: None,
        phase: Phase::Hero,
        phase_start_ms: now,
        toast_until_ms: 0.0,
    };

    // Deep link: restore a specific card from `?p=<id>`. A lookup miss is a
    // normal outcome and falls back to the hero screen.
    if let Some(id) = deep_link_id(&win) {
        if let Some(p) = predictions::find_by_id(&state.predictions, id) {
            state.current = Some(p.clone());
            state.previous_id = Some(p.id);
            state.phase = Phase::Card;
        }
    }

    APP_STATE.with(|cell| cell.replace(Some(state)));

    ensure_buttons(&doc)?;
    start_render_loop();
    Ok(())
}

/// Create the draw / share overlay buttons once and hook up their listeners.
fn ensure_buttons(doc: &Document) -> Result<(), JsValue> {
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;

    if doc.get_element_by_id("fc-draw").is_none() {
        let btn = doc.create_element("button")?;
        btn.set_id("fc-draw");
        btn.set_text_content(Some("Отримати передбачення"));
        btn.set_attribute("style", "position:fixed; bottom:7%; left:50%; transform:translateX(-50%); padding:14px 34px; font-family:'Playfair Display', Georgia, serif; font-size:19px; font-weight:600; color:#6b4a52; background:#ffc1cc; border:none; border-radius:999px; box-shadow:0 8px 32px rgba(255,193,204,0.4); cursor:pointer; z-index:30;").ok();
        body.append_child(&btn)?;

        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            APP_STATE.with(|cell| {
                if let Some(state) = cell.borrow_mut().as_mut() {
                    draw_new_prediction(state);
                }
            });
        }) as Box<dyn FnMut(_)>);
        btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    if doc.get_element_by_id("fc-share").is_none() {
        let btn = doc.create_element("button")?;
        btn.set_id("fc-share");
        btn.set_text_content(Some("Поділитись"));
        btn.set_attribute("style", "display:none; position:fixed; bottom:14%; left:50%; transform:translateX(-50%); padding:11px 28px; font-family:'Playfair Display', Georgia, serif; font-size:17px; font-weight:600; color:#6b4a52; background:rgba(255,255,255,0.55); border:1px solid rgba(255,255,255,0.7); border-radius:999px; box-shadow:0 4px 16px rgba(142,93,103,0.15); cursor:pointer; z-index:30;").ok();
        body.append_child(&btn)?;

        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            APP_STATE.with(|cell| {
                if let Some(state) = cell.borrow_mut().as_mut() {
                    let now = window()
                        .and_then(|w| w.performance())
                        .map(|p| p.now())
                        .unwrap_or(0.0);
                    share_or_export(state, now);
                }
            });
        }) as Box<dyn FnMut(_)>);
        btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

fn show_error_overlay(doc: &Document) -> Result<(), JsValue> {
    if doc.get_element_by_id("fc-error").is_none() {
        if let Some(body) = doc.body() {
            let div = doc.create_element("div")?;
            div.set_id("fc-error");
            div.set_text_content(Some("Не вдалося завантажити передбачення."));
            div.set_attribute("style", "position:fixed; top:50%; left:50%; transform:translate(-50%,-50%); font-family:Georgia, serif; font-size:20px; color:#6b4a52; padding:18px 28px; background:rgba(255,255,255,0.6); border:1px solid rgba(255,255,255,0.8); border-radius:16px; z-index:50;").ok();
            body.append_child(&div)?;
        }
    }
    Ok(())
}

// --- Draw / Share actions ----------------------------------------------------

fn draw_new_prediction(state: &mut AppState) {
    let picked = match predictions::pick_random(&state.predictions, state.previous_id) {
        Ok(p) => p.clone(),
        Err(err) => {
            console::error_1(&JsValue::from_str(&format!("prediction draw failed: {err}")));
            return;
        }
    };
    state.previous_id = Some(picked.id);
    replace_url(picked.id);
    state.current = Some(picked);
    state.phase = Phase::Card;
    state.phase_start_ms = window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0);
}

/// Share the current card through the native share sheet when available,
/// otherwise export it as a PNG download, with a link-copy last resort.
fn share_or_export(state: &mut AppState, now: f64) {
    let Some(current) = state.current.clone() else {
        return;
    };
    let Some(win) = window() else { return };
    let url = share_url(&win, current.id);
    let navigator = win.navigator();

    let has_share =
        js_sys::Reflect::has(navigator.as_ref(), &JsValue::from_str("share")).unwrap_or(false);
    if has_share {
        let data = ShareData::new();
        data.set_title(HERO_TITLE);
        data.set_text(&current.text);
        data.set_url(&url);
        swallow_rejection(navigator.share_with_data(&data));
        return;
    }

    // No share sheet: hand the user a PNG of the card instead.
    match export_card_png(&win, &current) {
        Ok(()) => state.toast_until_ms = now + TOAST_MS,
        Err(err) => {
            console::warn_2(&JsValue::from_str("card image export failed"), &err);
            swallow_rejection(navigator.clipboard().write_text(&url));
            state.toast_until_ms = now + TOAST_MS;
        }
    }
}

/// Render the card on a detached canvas at a fixed, animation-free state and
/// trigger a download of the PNG through a temporary anchor.
fn export_card_png(win: &Window, current: &Prediction) -> Result<(), JsValue> {
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
    canvas.set_width(600);
    canvas.set_height(440);
    let ctx: CanvasRenderingContext2d = canvas.get_context("2d")?.unwrap().dyn_into()?;
    ctx.set_text_align("center");

    fill_backdrop(&ctx, 600.0, 440.0);
    draw_card_body(&ctx, current, 600.0, 440.0, f64::INFINITY);

    let data_url = canvas.to_data_url()?;
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
    let link: HtmlAnchorElement = doc.create_element("a")?.dyn_into()?;
    link.set_href(&data_url);
    link.set_download(DOWNLOAD_NAME);
    body.append_child(&link)?;
    link.click();
    body.remove_child(&link)?;
    Ok(())
}

// --- URL / deep-link plumbing -------------------------------------------------

/// Integer prediction id from the `?p=` query parameter, if a valid one is
/// present.
fn deep_link_id(win: &Window) -> Option<i64> {
    let search = win.location().search().ok()?;
    if search.is_empty() {
        return None;
    }
    let params = UrlSearchParams::new_with_str(&search).ok()?;
    params.get(QUERY_PARAM)?.trim().parse().ok()
}

/// Mirror the shown prediction id into the URL without navigating.
fn replace_url(id: i64) {
    if let Some(win) = window() {
        if let Ok(history) = win.history() {
            history
                .replace_state_with_url(
                    &JsValue::NULL,
                    "",
                    Some(&format!("?{QUERY_PARAM}={id}")),
                )
                .ok();
        }
    }
}

fn share_url(win: &Window, id: i64) -> String {
    match win.location().origin() {
        Ok(origin) => format!("{origin}/?{QUERY_PARAM}={id}"),
        Err(_) => format!("?{QUERY_PARAM}={id}"),
    }
}

/// Attach a no-op rejection handler so fire-and-forget browser promises
/// (share, clipboard) don't surface as unhandled rejections.
fn swallow_rejection(promise: js_sys::Promise) {
    let noop = Closure::wrap(Box::new(|_err: JsValue| {}) as Box<dyn FnMut(JsValue)>);
    let _ = promise.catch(&noop);
    noop.forget();
}

// --- Render loop --------------------------------------------------------------

fn start_render_loop() {
    let f: FrameCallback = std::rc::Rc::new(std::cell::RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        APP_STATE.with(|cell| {
            if let Some(state) = cell.borrow_mut().as_mut() {
                render_frame(state, ts);
                sync_buttons(state);
            }
        });
        if let Some(w) = window() {
            let _ =
                w.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = window() {
        let _ = w.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}

/// Keep the DOM overlay buttons in step with the current phase.
fn sync_buttons(state: &AppState) {
    if let Some(doc) = window().and_then(|w| w.document()) {
        if let Some(btn) = doc.get_element_by_id("fc-draw") {
            let label = match state.phase {
                Phase::Hero => "Отримати передбачення",
                Phase::Card => "Ще раз",
            };
            if btn.text_content().as_deref() != Some(label) {
                btn.set_text_content(Some(label));
            }
        }
        if let Some(btn) = doc.get_element_by_id("fc-share") {
            let visible = matches!(state.phase, Phase::Card);
            let display = if visible { "inline-block" } else { "none" };
            if let Some(style) = btn.get_attribute("style") {
                let wants_hidden = style.starts_with("display:none");
                if wants_hidden == visible {
                    let rest = style
                        .splitn(2, ';')
                        .nth(1)
                        .unwrap_or("")
                        .trim_start()
                        .to_owned();
                    btn.set_attribute("style", &format!("display:{display}; {rest}"))
                        .ok();
                }
            }
        }
    }
}

fn render_frame(state: &mut AppState, now: f64) {
    let w = state.canvas.width() as f64;
    let h = state.canvas.height() as f64;
    let t = now - state.phase_start_ms;

    fill_backdrop(&state.ctx, w, h);
    draw_bokeh(&state.ctx, now, w, h);

    match state.phase {
        Phase::Hero => draw_hero(&state.ctx, t, w, h),
        Phase::Card => {
            if let Some(current) = state.current.clone() {
                draw_card_body(&state.ctx, &current, w, h, t);
            }
        }
    }

    if now < state.toast_until_ms {
        draw_toast(&state.ctx, w, h);
    }
}

// --- Painting helpers ---------------------------------------------------------

/// Vertical pastel gradient used both on the page and on the exported card.
fn fill_backdrop(ctx: &CanvasRenderingContext2d, w: f64, h: f64) {
    let gradient = ctx.create_linear_gradient(0.0, 0.0, 0.0, h);
    gradient.add_color_stop(0.0, "#FDE2E4").ok();
    gradient.add_color_stop(0.5, "#FDF0F0").ok();
    gradient.add_color_stop(1.0, "#FFF1E6").ok();
    ctx.set_fill_style_canvas_gradient(&gradient);
    ctx.fill_rect(0.0, 0.0, w, h);
}

fn draw_bokeh(ctx: &CanvasRenderingContext2d, now: f64, w: f64, h: f64) {
    for b in BOKEH.iter() {
        let phase = (now + b.phase_ms) / b.period_ms * std::f64::consts::TAU;
        let cx = b.x_pct * w + phase.sin() * 40.0;
        let cy = b.y_pct * h + (phase * 0.7).cos() * 30.0;
        let scale = 1.0 + (phase * 1.3).sin() * 0.2;
        let r = b.radius * scale;
        if let Ok(gradient) = ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, r) {
            gradient.add_color_stop(0.0, "rgba(255,255,255,0.30)").ok();
            gradient.add_color_stop(1.0, "rgba(255,255,255,0.0)").ok();
            ctx.set_fill_style_canvas_gradient(&gradient);
            ctx.begin_path();
            ctx.arc(cx, cy, r, 0.0, std::f64::consts::TAU).ok();
            ctx.fill();
        }
    }
}

fn draw_hero(ctx: &CanvasRenderingContext2d, t: f64, w: f64, h: f64) {
    let title_font = format!("bold 44px {SERIF_STACK}");
    ctx.set_font(&title_font);
    ctx.set_fill_style_str("#6b4a52");
    ctx.set_global_alpha(ramp(t, 200.0, 600.0));
    let title_lines = wrap_text(ctx, HERO_TITLE, w * 0.85);
    let mut y = h * 0.34;
    for line in &title_lines {
        ctx.fill_text(line, w / 2.0, y).ok();
        y += 54.0;
    }

    ctx.set_font(&format!("20px {SERIF_STACK}"));
    ctx.set_global_alpha(ramp(t, 400.0, 600.0));
    ctx.set_fill_style_str("rgba(107,74,82,0.8)");
    for line in &wrap_text(ctx, HERO_SUBTITLE, w * 0.75) {
        ctx.fill_text(line, w / 2.0, y + 18.0).ok();
        y += 30.0;
    }
    ctx.set_global_alpha(1.0);
}

/// Paint the prediction card: frosted rounded panel, caption line, and the
/// prediction text with a staggered per-word fade. Pass `t = f64::INFINITY`
/// to render the fully revealed card (used by the PNG export).
fn draw_card_body(ctx: &CanvasRenderingContext2d, current: &Prediction, w: f64, h: f64, t: f64) {
    let card_w = w * 0.86;
    let card_x = (w - card_w) / 2.0;
    let text_w = card_w - 80.0;

    // Lay the text out first so the card height can hug it.
    ctx.set_font(&format!("26px {SERIF_STACK}"));
    let lines = wrap_text(ctx, &current.text, text_w);
    let line_h = 38.0;
    let card_h = 150.0 + lines.len() as f64 * line_h;
    let card_y = (h - card_h) / 2.0;

    ctx.set_global_alpha(ramp(t, 0.0, 400.0));
    ctx.set_shadow_color("rgba(142,93,103,0.18)");
    ctx.set_shadow_blur(24.0);
    ctx.set_shadow_offset_y(8.0);
    ctx.set_fill_style_str("rgba(255,255,255,0.40)");
    rounded_rect_path(ctx, card_x, card_y, card_w, card_h, 32.0);
    ctx.fill();
    ctx.set_shadow_blur(0.0);
    ctx.set_shadow_offset_y(0.0);
    ctx.set_stroke_style_str("rgba(255,255,255,0.60)");
    ctx.set_line_width(1.5);
    rounded_rect_path(ctx, card_x, card_y, card_w, card_h, 32.0);
    ctx.stroke();

    ctx.set_font(&format!("italic 17px {SERIF_STACK}"));
    ctx.set_fill_style_str("rgba(107,74,82,0.7)");
    ctx.set_global_alpha(ramp(t, 100.0, 500.0));
    ctx.fill_text(CARD_CAPTION, w / 2.0, card_y + 56.0).ok();

    // Prediction text, revealed word by word.
    ctx.set_font(&format!("26px {SERIF_STACK}"));
    ctx.set_fill_style_str("#6b4a52");
    let mut word_idx = 0usize;
    let mut y = card_y + 118.0;
    let space_w = text_width(ctx, " ");
    for line in &lines {
        let words: Vec<&str> = line.split_whitespace().collect();
        let line_w: f64 = words.iter().map(|word| text_width(ctx, word)).sum::<f64>()
            + space_w * words.len().saturating_sub(1) as f64;
        let mut x = (w - line_w) / 2.0;
        ctx.set_text_align("left");
        for word in words {
            let alpha = ramp(t, REVEAL_DELAY_MS + word_idx as f64 * WORD_STAGGER_MS, WORD_FADE_MS);
            ctx.set_global_alpha(alpha);
            // Words slide up a touch as they fade in.
            let dy = (1.0 - alpha) * 10.0;
            ctx.fill_text(word, x, y + dy).ok();
            x += text_width(ctx, word) + space_w;
            word_idx += 1;
        }
        ctx.set_text_align("center");
        y += line_h;
    }
    ctx.set_global_alpha(1.0);
}

fn draw_toast(ctx: &CanvasRenderingContext2d, w: f64, h: f64) {
    let label = "Готово!";
    ctx.set_font(&format!("16px {SERIF_STACK}"));
    let pill_w = text_width(ctx, label) + 44.0;
    let pill_h = 38.0;
    let x = (w - pill_w) / 2.0;
    let y = h * 0.88;
    ctx.set_fill_style_str("rgba(107,74,82,0.85)");
    rounded_rect_path(ctx, x, y, pill_w, pill_h, pill_h / 2.0);
    ctx.fill();
    ctx.set_fill_style_str("#fff1e6");
    ctx.fill_text(label, w / 2.0, y + 25.0).ok();
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.quadratic_curve_to(x + w, y, x + w, y + r);
    ctx.line_to(x + w, y + h - r);
    ctx.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
    ctx.line_to(x + r, y + h);
    ctx.quadratic_curve_to(x, y + h, x, y + h - r);
    ctx.line_to(x, y + r);
    ctx.quadratic_curve_to(x, y, x + r, y);
    ctx.close_path();
}

/// Greedy word wrap against the context's current font.
fn wrap_text(ctx: &CanvasRenderingContext2d, text: &str, max_width: f64) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_owned()
        } else {
            format!("{line} {word}")
        };
        if !line.is_empty() && text_width(ctx, &candidate) > max_width {
            lines.push(std::mem::take(&mut line));
            line = word.to_owned();
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn text_width(ctx: &CanvasRenderingContext2d, text: &str) -> f64 {
    ctx.measure_text(text)
        .map(|m| m.width())
        // measure_text only fails on a broken context; a rough estimate keeps
        // layout going instead of panicking.
        .unwrap_or_else(|_| text.chars().count() as f64 * 13.0)
}

/// Linear 0→1 ramp starting `delay` ms into the phase, over `dur` ms.
fn ramp(t: f64, delay: f64, dur: f64) -> f64 {
    ((t - delay) / dur).clamp(0.0, 1.0)
}
