use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Event, HtmlButtonElement, HtmlCanvasElement, KeyboardEvent,
    PointerEvent, Window,
};

use tracedrive_shared::MessageResponse;

use crate::dom::{debug_enabled, event_to_point, find_element, get_element, notify};
use crate::net::{send_path, server_base, start_detection, TransportError};
use crate::render::CanvasSurface;
use crate::state::Controller;

const RESET_KEY: &str = "r";

fn document_ready_state(document: &web_sys::Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() != Some("loading") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    document
        .add_event_listener_with_callback("DOMContentLoaded", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let canvas: HtmlCanvasElement = get_element(&document, "drawingCanvas")?;
    let send_button: HtmlButtonElement = get_element(&document, "sendBtn")?;
    let clear_button: Option<HtmlButtonElement> = find_element(&document, "clearButton");
    let detection_button: Option<HtmlButtonElement> =
        find_element(&document, "startDetectionBtn");

    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    let server = server_base(&window, &canvas)?;
    let debug = debug_enabled(&window);
    web_sys::console::log_1(&format!("Path server: {server}").into());

    let controller = Rc::new(RefCell::new(Controller::new(
        CanvasSurface::new(&canvas, ctx),
        server,
        debug,
    )));

    {
        let down_controller = controller.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            down_controller.borrow_mut().begin(event_to_point(&event));
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let move_controller = controller.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            move_controller.borrow_mut().extend(event_to_point(&event));
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    {
        let stop_controller = controller.clone();
        let onstop = Closure::<dyn FnMut(PointerEvent)>::new(move |_: PointerEvent| {
            stop_controller.borrow_mut().end();
        });
        for event_name in ["pointerup", "pointerleave"] {
            canvas.add_event_listener_with_callback(event_name, onstop.as_ref().unchecked_ref())?;
        }
        onstop.forget();
    }

    {
        let key_controller = controller.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if event.key().eq_ignore_ascii_case(RESET_KEY) {
                key_controller.borrow_mut().reset();
            }
        });
        document.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    if let Some(clear_button) = clear_button {
        let clear_controller = controller.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            clear_controller.borrow_mut().reset();
        });
        clear_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let send_controller = controller.clone();
        let window_cb = window.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let (request, server) = {
                let controller = send_controller.borrow();
                match controller.prepare_send() {
                    Ok(request) => (request, controller.server.clone()),
                    Err(error) => {
                        web_sys::console::warn_1(&format!("Send refused: {error}").into());
                        notify(&window_cb, "Please draw a path first!");
                        return;
                    }
                }
            };
            web_sys::console::log_1(
                &format!(
                    "Sending simplified path with {} points",
                    request.path_points.len()
                )
                .into(),
            );
            let window = window_cb.clone();
            wasm_bindgen_futures::spawn_local(async move {
                report_send(&window, send_path(&window, &server, &request).await);
            });
        });
        send_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    if let Some(detection_button) = detection_button {
        let server = controller.borrow().server.clone();
        let window_cb = window.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let window = window_cb.clone();
            let server = server.clone();
            web_sys::console::log_1(&"Starting green detection...".into());
            wasm_bindgen_futures::spawn_local(async move {
                match start_detection(&window, &server).await {
                    Ok(reply) => {
                        web_sys::console::log_1(
                            &format!("Detection start response: {reply}").into(),
                        );
                        notify(&window, "Green detection started!");
                    }
                    Err(error) => {
                        web_sys::console::error_1(
                            &format!("Error starting detection: {error}").into(),
                        );
                        notify(&window, "Failed to start detection.");
                    }
                }
            });
        });
        detection_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    Ok(())
}

/// Completion of a send only reaches the console and the alert; the capture is untouched.
fn report_send(window: &Window, result: Result<MessageResponse, TransportError>) {
    match result {
        Ok(reply) => {
            web_sys::console::log_1(&format!("Server response: {}", reply.message).into());
            notify(window, &reply.message);
        }
        Err(error) => {
            web_sys::console::error_1(&format!("Error: {error}").into());
            notify(window, "Failed to send path. See console for details.");
        }
    }
}
