// src/form/field_detector.rs
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::config::SiteSelectors;
use crate::types::{Field, FieldKind, FieldOption};
use crate::utils::clean_text;

/// Prefix of the synthetic identifier given to radio groups.
pub const RADIO_GROUP_PREFIX: &str = "radio-group:";

/// Finds fillable question fields in a serialized page.
pub struct FieldDetector {
    selectors: SiteSelectors,
}

enum Slot {
    Field(Field),
    Group(usize),
}

struct RadioGroup<'a> {
    key: String,
    name: Option<String>,
    members: Vec<ElementRef<'a>>,
}

/// First non-empty `label[for]` per target id.
struct LabelIndex<'a> {
    by_target: HashMap<String, ElementRef<'a>>,
}

impl<'a> LabelIndex<'a> {
    fn build(document: &'a Html) -> Self {
        let mut by_target = HashMap::new();
        if let Ok(selector) = Selector::parse("label[for]") {
            for label in document.select(&selector) {
                let Some(target) = label.value().attr("for") else {
                    continue;
                };
                if text_of(label).is_empty() {
                    continue;
                }
                by_target.entry(target.to_string()).or_insert(label);
            }
        }
        Self { by_target }
    }

    fn get(&self, target: &str) -> Option<ElementRef<'a>> {
        self.by_target.get(target).copied()
    }

    fn text_for(&self, target: &str) -> Option<String> {
        self.get(target).map(text_of).filter(|t| !t.is_empty())
    }
}

impl FieldDetector {
    pub fn new(selectors: SiteSelectors) -> Self {
        Self { selectors }
    }

    /// Detect fields in document order. Radio groups take the position of their first member.
    pub fn detect(&self, html: &str) -> Vec<Field> {
        let document = Html::parse_document(html);
        let labels = LabelIndex::build(&document);

        let Ok(controls) = Selector::parse("input, textarea, select") else {
            return Vec::new();
        };

        let mut slots: Vec<Slot> = Vec::new();
        let mut groups: Vec<RadioGroup> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for element in document.select(&controls) {
            let id = element.value().attr("id").unwrap_or("").trim();
            if id.is_empty() || !seen_ids.insert(id.to_string()) {
                continue;
            }

            match element.value().name() {
                "input" if self.is_radio(element, id) => {
                    let name = element
                        .value()
                        .attr("name")
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .map(str::to_string);
                    let key = name.clone().unwrap_or_else(|| id_stem(id).to_string());

                    match group_index.get(&key) {
                        Some(&idx) => groups[idx].members.push(element),
                        None => {
                            group_index.insert(key.clone(), groups.len());
                            slots.push(Slot::Group(groups.len()));
                            groups.push(RadioGroup {
                                key,
                                name,
                                members: vec![element],
                            });
                        }
                    }
                }
                "input" if self.is_text_input(element, id) => {
                    let label = self.scalar_label(&labels, element, id);
                    slots.push(Slot::Field(Field::scalar(id, FieldKind::Text, label)));
                }
                "textarea" if id.starts_with(&self.selectors.textarea_prefix) => {
                    let label = self.scalar_label(&labels, element, id);
                    slots.push(Slot::Field(Field::scalar(id, FieldKind::Textarea, label)));
                }
                "select" if id.starts_with(&self.selectors.select_prefix) => {
                    let label = self.scalar_label(&labels, element, id);
                    let field =
                        Field::choice(id, FieldKind::SingleSelect, label, select_options(element));
                    if field.valid_option_labels().is_empty() {
                        debug!("Dropping dropdown {} without selectable options", id);
                        continue;
                    }
                    slots.push(Slot::Field(field));
                }
                _ => {}
            }
        }

        let mut fields = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Slot::Field(field) => fields.push(field),
                Slot::Group(idx) => {
                    if let Some(field) = self.build_group(&labels, &groups[idx], &seen_ids) {
                        fields.push(field);
                    }
                }
            }
        }

        info!("Detected {} form field(s)", fields.len());
        fields
    }

    fn is_radio(&self, element: ElementRef, id: &str) -> bool {
        input_type(element) == "radio" && id.starts_with(&self.selectors.radio_prefix)
    }

    fn is_text_input(&self, element: ElementRef, id: &str) -> bool {
        let kind = input_type(element);
        matches!(
            kind.as_str(),
            "" | "text" | "email" | "tel" | "number" | "url" | "search"
        ) && id.starts_with(&self.selectors.text_input_prefix)
    }

    /// Explicit `label[for]`, then the question container's label, then the id itself.
    fn scalar_label(&self, labels: &LabelIndex, element: ElementRef, id: &str) -> String {
        labels
            .text_for(id)
            .or_else(|| self.container_label(element))
            .unwrap_or_else(|| id.to_string())
    }

    fn question_container<'a>(&self, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let class = self.selectors.question_container_class.as_str();
        if class.is_empty() {
            return None;
        }
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|a| a.value().attr("class").is_some_and(|c| c.contains(class)))
    }

    fn container_label(&self, element: ElementRef) -> Option<String> {
        let container = self.question_container(element)?;
        let selector = Selector::parse("label").ok()?;
        container
            .select(&selector)
            .map(text_of)
            .find(|t| !t.is_empty())
    }

    fn build_group(
        &self,
        labels: &LabelIndex,
        group: &RadioGroup,
        taken_ids: &HashSet<String>,
    ) -> Option<Field> {
        let identifier = format!("{}{}", RADIO_GROUP_PREFIX, group.key);
        if taken_ids.contains(&identifier) {
            debug!("Radio group key {} collides with a field id", identifier);
            return None;
        }

        let options: Vec<FieldOption> = group
            .members
            .iter()
            .filter_map(|radio| {
                let id = radio.value().attr("id")?.trim();
                let mut option = FieldOption::new(id, option_label(labels, *radio, id));
                if let Some(value) = radio.value().attr("value") {
                    option = option.with_value(value);
                }
                Some(option)
            })
            .collect();

        if options.is_empty() {
            return None;
        }

        let member_ids: HashSet<&str> = options.iter().map(|o| o.identifier.as_str()).collect();
        let label = self.group_label(labels, group, &member_ids);

        Some(Field::choice(identifier, FieldKind::RadioGroup, label, options))
    }

    /// Resolved once per group: `label[for=name]`, then the container's legend, then the
    /// first container label that is not an option label, then the group name.
    fn group_label(&self, labels: &LabelIndex, group: &RadioGroup, member_ids: &HashSet<&str>) -> String {
        if let Some(text) = group.name.as_deref().and_then(|n| labels.text_for(n)) {
            return text;
        }

        let container = group.members.first().and_then(|first| {
            self.question_container(*first).or_else(|| {
                first
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|a| a.value().name() == "fieldset")
            })
        });

        if let Some(container) = container {
            if let Ok(legend) = Selector::parse("legend") {
                if let Some(text) = container.select(&legend).map(text_of).find(|t| !t.is_empty()) {
                    return text;
                }
            }
            if let Ok(label) = Selector::parse("label") {
                let question = container
                    .select(&label)
                    .filter(|l| !is_option_label(*l, member_ids))
                    .map(text_of)
                    .find(|t| !t.is_empty());
                if let Some(text) = question {
                    return text;
                }
            }
        }

        group.name.clone().unwrap_or_else(|| group.key.clone())
    }
}

fn input_type(element: ElementRef) -> String {
    element
        .value()
        .attr("type")
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

fn text_of(element: ElementRef) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// `single-select-question-:r1:-0` → `single-select-question-:r1:`
fn id_stem(id: &str) -> &str {
    match id.rsplit_once('-') {
        Some((stem, tail)) if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) => stem,
        _ => id,
    }
}

fn is_option_label(label: ElementRef, member_ids: &HashSet<&str>) -> bool {
    if let Some(target) = label.value().attr("for") {
        if member_ids.contains(target) {
            return true;
        }
    }
    Selector::parse("input[type='radio']")
        .map(|radio| label.select(&radio).next().is_some())
        .unwrap_or(false)
}

fn option_label(labels: &LabelIndex, radio: ElementRef, id: &str) -> String {
    if let Some(label) = labels.get(id) {
        if let Ok(span) = Selector::parse("span") {
            if let Some(text) = label.select(&span).map(text_of).find(|t| !t.is_empty()) {
                return text;
            }
        }
        return text_of(label);
    }

    // <label><input type="radio"> Yes</label>
    if let Some(wrapping) = radio
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "label")
    {
        let text = text_of(wrapping);
        if !text.is_empty() {
            return text;
        }
    }

    radio
        .value()
        .attr("aria-label")
        .or_else(|| radio.value().attr("value"))
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| id.to_string())
}

fn select_options(select: ElementRef) -> Vec<FieldOption> {
    let Ok(selector) = Selector::parse("option") else {
        return Vec::new();
    };

    select
        .select(&selector)
        .map(|option| {
            let text = text_of(option);
            let label = option
                .value()
                .attr("label")
                .map(clean_text)
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| text.clone());
            // Without a value attribute the browser submits the option text.
            let value = option
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or(text);
            FieldOption::new(option.value().attr("id").unwrap_or(""), label).with_value(value)
        })
        .collect()
}
