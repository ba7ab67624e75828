//! Scripted in-memory page for driving the resolver and executor without a
//! browser. Element visibility is a function of (virtual) time since the
//! page was created, so tests run under `start_paused = true`.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uiscout_lib::browser::{Dialog, ElementState, Navigation, Page, PageFactory};
use uiscout_lib::locator::Locator;
use uiscout_lib::{Result, UiScoutError};

/// What a locator matches on the scripted page.
#[derive(Debug, Clone)]
pub struct Element {
    /// `None` means never visible
    pub visible_from: Option<Duration>,
    pub hidden_from: Option<Duration>,
    pub count: usize,
    pub enabled: bool,
    pub text: String,
}

impl Element {
    pub fn visible() -> Self {
        Self::visible_after(0)
    }

    pub fn visible_after(ms: u64) -> Self {
        Self {
            visible_from: Some(Duration::from_millis(ms)),
            hidden_from: None,
            count: 1,
            enabled: true,
            text: String::new(),
        }
    }

    /// Present in the DOM but never shown.
    pub fn never() -> Self {
        Self {
            visible_from: None,
            ..Self::visible()
        }
    }

    pub fn hidden_after(mut self, ms: u64) -> Self {
        self.hidden_from = Some(Duration::from_millis(ms));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn is_visible(&self, now: Duration) -> bool {
        let shown = self.visible_from.is_some_and(|from| now >= from);
        let hidden = self.hidden_from.is_some_and(|from| now >= from);
        shown && !hidden
    }
}

/// Side effect of clicking an element.
#[derive(Debug, Clone)]
pub enum Effect {
    Dialog(String),
    /// Navigate (fires a load event)
    Navigate(String),
    /// Change the URL without a load event
    SetUrl(String),
    SetCount(Locator, usize),
    Hide(Locator),
    Show(Locator),
}

#[derive(Default)]
struct State {
    url: String,
    status: Option<u16>,
    elements: HashMap<String, Element>,
    /// Effects per click, in order; the last entry repeats
    on_click: HashMap<String, Vec<Vec<Effect>>>,
    broken: Vec<String>,
    dialogs: Vec<Dialog>,
    loads: u64,
    inspected: Vec<Locator>,
    clicks: Vec<Locator>,
    fills: Vec<(Locator, String)>,
    gotos: Vec<String>,
    scripts: Vec<String>,
    closed: bool,
}

/// Cheap to clone; clones share state so tests can look inside after a run.
#[derive(Clone)]
pub struct ScriptedPage {
    start: Instant,
    state: Arc<Mutex<State>>,
}

fn key(locator: &Locator) -> String {
    locator.describe()
}

impl ScriptedPage {
    pub fn new(url: &str) -> Self {
        Self {
            start: Instant::now(),
            state: Arc::new(Mutex::new(State {
                url: url.to_string(),
                status: Some(200),
                ..State::default()
            })),
        }
    }

    pub fn with(self, locator: Locator, element: Element) -> Self {
        self.state.lock().elements.insert(key(&locator), element);
        self
    }

    pub fn on_click(self, locator: Locator, effects: Vec<Effect>) -> Self {
        self.on_clicks(locator, vec![effects])
    }

    /// Different effects for the first, second, ... click.
    pub fn on_clicks(self, locator: Locator, effects: Vec<Vec<Effect>>) -> Self {
        self.state.lock().on_click.insert(key(&locator), effects);
        self
    }

    /// Inspecting this locator fails like a dead browser would.
    pub fn broken(self, locator: Locator) -> Self {
        self.state.lock().broken.push(key(&locator));
        self
    }

    pub fn status(self, status: Option<u16>) -> Self {
        self.state.lock().status = status;
        self
    }

    pub fn open_dialog(&self, message: &str) {
        self.state.lock().dialogs.push(Dialog {
            kind: "alert".to_string(),
            message: message.to_string(),
        });
    }

    pub fn inspected(&self) -> Vec<Locator> {
        self.state.lock().inspected.clone()
    }

    pub fn clicks(&self) -> Vec<Locator> {
        self.state.lock().clicks.clone()
    }

    pub fn fills(&self) -> Vec<(Locator, String)> {
        self.state.lock().fills.clone()
    }

    pub fn gotos(&self) -> Vec<String> {
        self.state.lock().gotos.clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().scripts.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn visible_element(&self, state: &State, locator: &Locator) -> bool {
        state
            .elements
            .get(&key(locator))
            .is_some_and(|e| e.is_visible(self.now()))
    }
}

#[async_trait]
impl Page for ScriptedPage {
    async fn goto(&self, url: &str) -> Result<Navigation> {
        let mut state = self.state.lock();
        state.gotos.push(url.to_string());
        state.url = url.to_string();
        state.loads += 1;
        Ok(Navigation {
            url: url.to_string(),
            status: state.status,
        })
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().url.clone())
    }

    async fn inspect(&self, locator: &Locator) -> Result<ElementState> {
        let mut state = self.state.lock();
        state.inspected.push(locator.clone());
        if state.broken.contains(&key(locator)) {
            return Err(UiScoutError::Browser("target closed".to_string()));
        }
        Ok(match state.elements.get(&key(locator)) {
            Some(element) => ElementState {
                count: element.count,
                visible: element.is_visible(self.now()),
                enabled: element.enabled,
                text: Some(element.text.clone()),
            },
            None => ElementState::default(),
        })
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let mut state = self.state.lock();
        if !self.visible_element(&state, locator) {
            return Err(UiScoutError::Browser(format!(
                "No visible element to click: {}",
                locator
            )));
        }
        let nth = state.clicks.iter().filter(|l| key(l) == key(locator)).count();
        state.clicks.push(locator.clone());

        let now = self.now();
        let effects = state
            .on_click
            .get(&key(locator))
            .and_then(|per_click| per_click.get(nth).or_else(|| per_click.last()))
            .cloned()
            .unwrap_or_default();
        for effect in effects {
            match effect {
                Effect::Dialog(message) => state.dialogs.push(Dialog {
                    kind: "alert".to_string(),
                    message,
                }),
                Effect::Navigate(url) => {
                    state.url = url;
                    state.loads += 1;
                }
                Effect::SetUrl(url) => state.url = url,
                Effect::SetCount(target, count) => {
                    if let Some(element) = state.elements.get_mut(&key(&target)) {
                        element.count = count;
                    }
                }
                Effect::Hide(target) => {
                    if let Some(element) = state.elements.get_mut(&key(&target)) {
                        element.hidden_from = Some(now);
                    }
                }
                Effect::Show(target) => {
                    let element = state
                        .elements
                        .entry(key(&target))
                        .or_insert_with(Element::never);
                    element.visible_from = Some(now);
                    element.hidden_from = None;
                }
            }
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        let mut state = self.state.lock();
        if !self.visible_element(&state, locator) {
            return Err(UiScoutError::Browser(format!(
                "No visible element to fill: {}",
                locator
            )));
        }
        state.fills.push((locator.clone(), value.to_string()));
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value> {
        self.state.lock().scripts.push(expression.to_string());
        Ok(serde_json::Value::Null)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(b"\x89PNG scripted".to_vec())
    }

    fn dialogs(&self) -> Vec<Dialog> {
        self.state.lock().dialogs.clone()
    }

    fn load_count(&self) -> u64 {
        self.state.lock().loads
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}

/// Hands out pre-built pages by scenario name.
#[derive(Default)]
pub struct ScriptedFactory {
    pages: Mutex<HashMap<String, ScriptedPage>>,
}

impl ScriptedFactory {
    pub fn page(self, scenario: &str, page: ScriptedPage) -> Self {
        self.pages.lock().insert(scenario.to_string(), page);
        self
    }
}

#[async_trait]
impl PageFactory for ScriptedFactory {
    async fn open(&self, scenario: &str) -> Result<Box<dyn Page>> {
        match self.pages.lock().get(scenario) {
            Some(page) => Ok(Box::new(page.clone())),
            None => Err(UiScoutError::Browser(format!(
                "Chrome failed to start for {}",
                scenario
            ))),
        }
    }
}
