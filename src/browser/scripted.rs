// src/browser/scripted.rs
//! In-memory `PageDriver` for tests: a list of screens, click transitions between them and
//! a log of every interaction.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Locator, PageDriver};
use crate::error::DriverError;
use crate::utils::clean_text;

#[derive(Debug, Clone)]
pub struct Screen {
    pub url: String,
    pub html: String,
    transitions: Vec<(Locator, usize)>,
}

impl Screen {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            transitions: Vec::new(),
        }
    }

    /// Clicking `locator` on this screen shows screen `target`.
    pub fn on(mut self, locator: Locator, target: usize) -> Self {
        self.transitions.push((locator, target));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Clicked(Locator),
    Focused(String),
    Typed(String, char),
    SetValue(String, String),
    Selected(String, String),
    Checked(String),
    Uploaded(String, PathBuf),
    Escape,
}

impl Action {
    fn writes_to(&self, id: &str) -> bool {
        match self {
            Action::Typed(target, _)
            | Action::SetValue(target, _)
            | Action::Selected(target, _)
            | Action::Checked(target) => target == id,
            _ => false,
        }
    }
}

#[derive(Default)]
struct State {
    current: usize,
    values: HashMap<String, String>,
    selected: HashMap<String, String>,
    checked: HashMap<String, bool>,
    actions: Vec<Action>,
}

pub struct ScriptedPage {
    screens: Vec<Screen>,
    state: Mutex<State>,
}

impl ScriptedPage {
    pub fn new(screens: Vec<Screen>) -> Self {
        Self {
            screens,
            state: Mutex::new(State::default()),
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    pub fn current_url(&self) -> String {
        self.screens[self.lock().current].url.clone()
    }

    pub fn write_count(&self, id: &str) -> usize {
        self.lock().actions.iter().filter(|a| a.writes_to(id)).count()
    }

    pub fn clicks_on(&self, locator: &Locator) -> usize {
        self.lock()
            .actions
            .iter()
            .filter(|a| matches!(a, Action::Clicked(l) if l == locator))
            .count()
    }

    pub fn field_value(&self, id: &str) -> Option<String> {
        self.lock().values.get(id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn document(&self) -> Html {
        let current = self.lock().current;
        Html::parse_document(&self.screens[current].html)
    }

    /// Element id of the first match, or an error naming the locator.
    fn target_id(&self, locator: &Locator) -> Result<String, DriverError> {
        let doc = self.document();
        let element = find(&doc, locator)
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NotFound(locator.to_string()))?;
        Ok(element
            .value()
            .attr("id")
            .map(str::to_string)
            .unwrap_or_else(|| locator.to_string()))
    }
}

fn find<'a>(doc: &'a Html, locator: &Locator) -> Vec<ElementRef<'a>> {
    match locator {
        Locator::Id(id) => Selector::parse("[id]")
            .map(|s| {
                doc.select(&s)
                    .filter(|e| e.value().attr("id") == Some(id.as_str()))
                    .collect()
            })
            .unwrap_or_default(),
        Locator::Css(css) => Selector::parse(css)
            .map(|s| doc.select(&s).collect())
            .unwrap_or_default(),
        Locator::Button(label) => Selector::parse("button, a, [role='button']")
            .map(|s| {
                doc.select(&s)
                    .filter(|e| {
                        clean_text(&e.text().collect::<String>()).eq_ignore_ascii_case(label.trim())
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn option_label(option: ElementRef) -> String {
    option
        .value()
        .attr("label")
        .map(clean_text)
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| clean_text(&option.text().collect::<Vec<_>>().join(" ")))
}

fn option_value(option: ElementRef) -> String {
    option
        .value()
        .attr("value")
        .map(str::to_string)
        .unwrap_or_else(|| clean_text(&option.text().collect::<Vec<_>>().join(" ")))
}

fn options_of(element: ElementRef) -> Vec<ElementRef> {
    Selector::parse("option")
        .map(|s| element.select(&s).collect())
        .unwrap_or_default()
}

#[async_trait]
impl PageDriver for ScriptedPage {
    async fn url(&self) -> Result<String, DriverError> {
        Ok(self.current_url())
    }

    async fn content(&self) -> Result<String, DriverError> {
        Ok(self.screens[self.lock().current].html.clone())
    }

    async fn count(&self, locator: &Locator) -> Result<usize, DriverError> {
        Ok(find(&self.document(), locator).len())
    }

    async fn click(&self, locator: &Locator) -> Result<(), DriverError> {
        self.target_id(locator)?;
        let mut state = self.lock();
        state.actions.push(Action::Clicked(locator.clone()));

        let next = self.screens[state.current]
            .transitions
            .iter()
            .find(|(l, _)| l == locator)
            .map(|(_, target)| *target);
        if let Some(target) = next {
            state.current = target;
        }
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), DriverError> {
        self.target_id(locator).map(|_| ())
    }

    async fn focus(&self, locator: &Locator) -> Result<(), DriverError> {
        let id = self.target_id(locator)?;
        self.lock().actions.push(Action::Focused(id));
        Ok(())
    }

    async fn type_char(&self, locator: &Locator, ch: char) -> Result<(), DriverError> {
        let id = self.target_id(locator)?;
        let mut state = self.lock();
        state.values.entry(id.clone()).or_default().push(ch);
        state.actions.push(Action::Typed(id, ch));
        Ok(())
    }

    async fn value(&self, locator: &Locator) -> Result<String, DriverError> {
        let id = self.target_id(locator)?;
        if let Some(value) = self.lock().values.get(&id) {
            return Ok(value.clone());
        }

        let doc = self.document();
        let element = find(&doc, locator)
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NotFound(locator.to_string()))?;
        Ok(match element.value().name() {
            "textarea" => element.text().collect::<String>(),
            _ => element.value().attr("value").unwrap_or("").to_string(),
        })
    }

    async fn set_value(&self, locator: &Locator, value: &str) -> Result<(), DriverError> {
        let id = self.target_id(locator)?;
        let mut state = self.lock();
        state.values.insert(id.clone(), value.to_string());
        state.actions.push(Action::SetValue(id, value.to_string()));
        Ok(())
    }

    async fn selected_value(&self, locator: &Locator) -> Result<Option<String>, DriverError> {
        let id = self.target_id(locator)?;
        if let Some(value) = self.lock().selected.get(&id) {
            return Ok(Some(value.clone()));
        }

        let doc = self.document();
        let Some(select) = find(&doc, locator).into_iter().next() else {
            return Err(DriverError::NotFound(locator.to_string()));
        };
        let options = options_of(select);
        // Browsers show the first option when none is marked selected.
        let chosen = options
            .iter()
            .find(|o| o.value().attr("selected").is_some())
            .or_else(|| options.first());
        Ok(chosen.map(|o| option_value(*o)))
    }

    async fn select_by_label(&self, locator: &Locator, label: &str) -> Result<(), DriverError> {
        let id = self.target_id(locator)?;
        let doc = self.document();
        let select = find(&doc, locator)
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NotFound(locator.to_string()))?;
        let option = options_of(select)
            .into_iter()
            .find(|o| option_label(*o) == label)
            .ok_or_else(|| DriverError::NotFound(format!("option \"{}\" in {}", label, locator)))?;

        let mut state = self.lock();
        state.selected.insert(id.clone(), option_value(option));
        state.actions.push(Action::Selected(id, label.to_string()));
        Ok(())
    }

    async fn is_checked(&self, locator: &Locator) -> Result<bool, DriverError> {
        let id = self.target_id(locator)?;
        if let Some(checked) = self.lock().checked.get(&id) {
            return Ok(*checked);
        }
        let doc = self.document();
        Ok(find(&doc, locator)
            .first()
            .is_some_and(|e| e.value().attr("checked").is_some()))
    }

    async fn check(&self, locator: &Locator) -> Result<(), DriverError> {
        let id = self.target_id(locator)?;
        let siblings: Vec<String> = {
            let doc = self.document();
            let name = find(&doc, locator)
                .first()
                .and_then(|e| e.value().attr("name").map(str::to_string));
            match (name, Selector::parse("input[type='radio'][name]")) {
                (Some(name), Ok(radios)) => doc
                    .select(&radios)
                    .filter(|r| r.value().attr("name") == Some(name.as_str()))
                    .filter_map(|r| r.value().attr("id").map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            }
        };

        let mut state = self.lock();
        for sibling in siblings {
            state.checked.insert(sibling, false);
        }
        state.checked.insert(id.clone(), true);
        state.actions.push(Action::Checked(id));
        Ok(())
    }

    async fn upload_file(&self, locator: &Locator, path: &Path) -> Result<(), DriverError> {
        let id = self.target_id(locator)?;
        self.lock()
            .actions
            .push(Action::Uploaded(id, path.to_path_buf()));
        Ok(())
    }

    async fn press_escape(&self) -> Result<(), DriverError> {
        self.lock().actions.push(Action::Escape);
        Ok(())
    }
}
