//! Ordered post-processing of admin action responses.
//!
//! Every resource action builds a JSON response and then hands it to the
//! [`Pipeline`] registered for that action in [`ActionHooks`]. Hooks run in
//! registration order, each seeing the previous hook's output.

use std::sync::Arc;

use iv_core::document::{is_truthy, IMAGE_KEYS, IMAGE_URLS};
use serde_json::{Map, Value};

/// Resource actions that carry an `after` pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Show,
    New,
    Edit,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Show => "show",
            Self::New => "new",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// A step run on an action response after the action itself completed.
pub trait AfterHook: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrite `response` in place.
    fn apply(&self, action: Action, response: &mut Value);
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct Pipeline {
    hooks: Vec<Arc<dyn AfterHook>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook; it runs after every hook already registered.
    pub fn then(mut self, hook: impl AfterHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn run(&self, action: Action, mut response: Value) -> Value {
        for hook in &self.hooks {
            tracing::trace!(hook = hook.name(), action = action.as_str(), "Running after hook");
            hook.apply(action, &mut response);
        }
        response
    }
}

/// One pipeline per action.
#[derive(Clone, Default)]
pub struct ActionHooks {
    pub list: Pipeline,
    pub show: Pipeline,
    pub new: Pipeline,
    pub edit: Pipeline,
    pub delete: Pipeline,
}

impl ActionHooks {
    /// Pipelines used by the Image resource: array normalization on every
    /// action that returns records.
    pub fn image_resource() -> Self {
        Self {
            list: Pipeline::new().then(NormalizeImageArrays),
            show: Pipeline::new().then(NormalizeImageArrays),
            new: Pipeline::new().then(NormalizeImageArrays),
            edit: Pipeline::new().then(NormalizeImageArrays),
            delete: Pipeline::new(),
        }
    }

    pub fn pipeline(&self, action: Action) -> &Pipeline {
        match action {
            Action::List => &self.list,
            Action::Show => &self.show,
            Action::New => &self.new,
            Action::Edit => &self.edit,
            Action::Delete => &self.delete,
        }
    }

    pub fn run(&self, action: Action, response: Value) -> Value {
        self.pipeline(action).run(action, response)
    }
}

// ---------------------------------------------------------------------------
// NormalizeImageArrays
// ---------------------------------------------------------------------------

/// Guarantees `imageUrls` and `imageKeys` are arrays in every record's params.
///
/// Applies to `records[*].params` (list) and `record.params` (single record).
pub struct NormalizeImageArrays;

impl AfterHook for NormalizeImageArrays {
    fn name(&self) -> &'static str {
        "normalize_image_arrays"
    }

    fn apply(&self, _action: Action, response: &mut Value) {
        if let Some(Value::Array(records)) = response.get_mut("records") {
            for record in records {
                normalize_record(record);
            }
        }
        if let Some(record) = response.get_mut("record") {
            normalize_record(record);
        }
    }
}

fn normalize_record(record: &mut Value) {
    let Value::Object(record) = record else {
        return;
    };
    let params = record
        .entry("params")
        .or_insert_with(|| Value::Object(Map::new()));
    if !params.is_object() {
        *params = Value::Object(Map::new());
    }
    if let Value::Object(params) = params {
        normalize_params(params);
    }
}

/// Normalize one params map.
///
/// A non-array `imageUrls` becomes a one-element array when truthy, else
/// empty. A non-array `imageKeys` becomes a one-element array when truthy,
/// else a copy of the normalized `imageUrls`.
pub fn normalize_params(params: &mut Map<String, Value>) {
    if !params.get(IMAGE_URLS).is_some_and(Value::is_array) {
        let urls = match params.remove(IMAGE_URLS) {
            Some(v) if is_truthy(Some(&v)) => vec![v],
            _ => Vec::new(),
        };
        params.insert(IMAGE_URLS.into(), Value::Array(urls));
    }

    if !params.get(IMAGE_KEYS).is_some_and(Value::is_array) {
        let keys = match params.remove(IMAGE_KEYS) {
            Some(v) if is_truthy(Some(&v)) => Value::Array(vec![v]),
            _ => params
                .get(IMAGE_URLS)
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
        };
        params.insert(IMAGE_KEYS.into(), keys);
    }
}
