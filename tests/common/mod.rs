#![allow(dead_code)]

pub mod fakes;
pub mod screens;

use ui_explorer::graph::geometry::BoundingBox;
use ui_explorer::graph::state_graph::{Edge, Element, State, StateGraph};
use ui_explorer::session::detector::DetectedElement;

use self::fakes::{Effect, FakeApp, goto};
use self::screens::*;

/// Root toolbar (File, Help, Logo), a File menu leading to a Settings page
/// that can only be left through its Back control, and an About dialog
/// closed by OK or Escape.
pub fn sample_app() -> FakeApp {
    FakeApp::new("root", root_screen())
        .screen("file_menu", file_menu_screen())
        .screen("about", about_screen())
        .screen("settings", settings_screen())
        .on_click("root", FILE_BUTTON, goto("file_menu"))
        .on_click("root", HELP_BUTTON, goto("about"))
        .on_click("root", QUIT_BUTTON, Effect::CloseWindow)
        .on_click("file_menu", SETTINGS_ITEM, goto("settings"))
        .on_click("file_menu", FILE_BUTTON, goto("root"))
        .on_key("file_menu", "Escape", goto("root"))
        .on_click("about", ABOUT_OK, goto("root"))
        .on_key("about", "Escape", goto("root"))
        .on_click("settings", SETTINGS_BACK, goto("root"))
}

pub fn detected(name: &str, bbox: BoundingBox) -> DetectedElement {
    DetectedElement::new(name, bbox)
}

pub fn element(state_id: &str, id: &str, name: &str, bbox: BoundingBox) -> Element {
    Element::new(id, state_id, name, bbox)
}

pub fn edge(from: &str, to: &str, trigger: &str) -> Edge {
    Edge {
        from_state_id: from.into(),
        to_state_id: to.into(),
        trigger_element_id: trigger.into(),
        action_label: format!("click {}", trigger),
    }
}

/// Graph matching `sample_app` after File → Settings and Help were explored.
/// Reference paths follow the `mem://<state>` convention of the harness.
pub fn sample_graph() -> StateGraph {
    let mut graph = StateGraph::with_root("mem://root");
    {
        let root = graph.state_mut("root").unwrap();
        root.add_element(element("root", "file", "File", FILE_BUTTON));
        root.add_element(element("root", "help", "Help", HELP_BUTTON));
        root.add_element(element("root", "logo", "Logo", LOGO));
    }

    let mut menu = State::new("menu", Some("root".into()), Some("file".into()), "mem://menu");
    menu.add_element(element("menu", "settings_item", "Settings...", SETTINGS_ITEM));
    graph.add_state(menu).unwrap();

    let settings = State::new("settings", Some("menu".into()), Some("settings_item".into()), "mem://settings");
    graph.add_state(settings).unwrap();

    let mut about = State::new("about", Some("root".into()), Some("help".into()), "mem://about");
    about.add_element(element("about", "ok", "OK", ABOUT_OK));
    graph.add_state(about).unwrap();

    graph.add_edge(edge("root", "menu", "file")).unwrap();
    graph.add_edge(edge("menu", "settings", "settings_item")).unwrap();
    graph.add_edge(edge("root", "about", "help")).unwrap();
    graph
}
