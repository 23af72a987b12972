use crate::commands::handler::CommandHandler;
use std::sync::Arc;

/// Commands in registration order. A message matches the first command whose
/// `/name` it starts with.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: Vec<(String, Arc<dyn CommandHandler>)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: CommandHandler + 'static>(&mut self, name: &str, command: C) {
        self.handlers.push((name.to_string(), Arc::new(command)));
    }

    pub fn find(&self, text: &str) -> Option<(&str, Arc<dyn CommandHandler>)> {
        self.handlers
            .iter()
            .find(|(name, _)| {
                text.strip_prefix('/')
                    .is_some_and(|rest| rest.starts_with(name.as_str()))
            })
            .map(|(name, handler)| (name.as_str(), handler.clone()))
    }

    /// `(name, description)` pairs for the platform's command menu.
    pub fn commands(&self) -> Vec<(String, String)> {
        self.handlers
            .iter()
            .map(|(name, handler)| (name.clone(), handler.description().to_string()))
            .collect()
    }
}
