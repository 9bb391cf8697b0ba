//! Built-in templates embedded at compile time.

use crate::template::{
    ChatbotHook, LandingHook, TemplateError, TemplateFiles, TemplateHandle, TemplateHook,
    TemplateStore, WebappHook,
};
use include_dir::{include_dir, Dir};
use std::sync::Arc;

/// Embedded templates directory.
static TEMPLATES_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Store backed by the templates embedded in the binary.
///
/// Each top-level subdirectory of `templates/` is one template; its name is
/// the template identifier.
#[derive(Debug, Clone, Default)]
pub struct BuiltinTemplates;

impl BuiltinTemplates {
    pub fn new() -> Self {
        Self
    }
}

fn hook_for(id: &str) -> Option<Arc<dyn TemplateHook>> {
    match id {
        "webapp" => Some(Arc::new(WebappHook)),
        "chatbot" => Some(Arc::new(ChatbotHook)),
        "landing" => Some(Arc::new(LandingHook)),
        _ => None,
    }
}

impl TemplateStore for BuiltinTemplates {
    fn resolve(&self, id: &str) -> Result<TemplateHandle, TemplateError> {
        let dir = TEMPLATES_DIR
            .get_dir(id)
            .ok_or_else(|| TemplateError::Unknown { id: id.to_string() })?;

        Ok(TemplateHandle {
            id: id.to_string(),
            files: TemplateFiles::Embedded(dir),
            hook: hook_for(id),
        })
    }

    fn template_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = TEMPLATES_DIR
            .dirs()
            .filter_map(|d| d.path().file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect();
        ids.sort();
        ids
    }
}
