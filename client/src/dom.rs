use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, MouseEvent, Window};

use tracedrive_shared::Point;

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

/// Like [`get_element`], for controls a page may leave out.
pub fn find_element<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document.get_element_by_id(id)?.dyn_into::<T>().ok()
}

pub fn debug_enabled(window: &Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1") || search.contains("debug=true")
}

/// Raw pixel offset of the event inside its target.
pub fn event_to_point(event: &MouseEvent) -> Point {
    Point::new(event.offset_x() as f64, event.offset_y() as f64)
}

pub fn notify(window: &Window, message: &str) {
    if window.alert_with_message(message).is_err() {
        web_sys::console::warn_1(&format!("Could not show notice: {message}").into());
    }
}
