use super::{
    BotContext, IncomingMessage,
    handler::{ModelCommand, ResetCommand, StartCommand},
    registry::CommandRegistry,
};
use crate::conversation;
use crate::core::error::BotError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
    ctx: BotContext,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<CommandRegistry>, ctx: BotContext) -> Self {
        Self { registry, ctx }
    }

    /// Commands are answered before returning. Anything else starts a
    /// conversational task whose handle is returned.
    pub async fn dispatch(&self, message: IncomingMessage) -> Option<JoinHandle<()>> {
        let Some((name, handler)) = self.registry.find(&message.text) else {
            debug!("Conversational message from user {}", message.owner_id);
            return Some(conversation::spawn(self.ctx.clone(), message));
        };

        debug!("Command /{} from user {}", name, message.owner_id);
        let args: Vec<&str> = message.text.split_whitespace().skip(1).collect();
        let reply = match handler.execute(&self.ctx, &message, &args).await {
            Ok(reply) => reply,
            Err(BotError::CommandUsage(usage)) => usage,
            Err(e) => {
                error!("Command /{} failed for user {}: {}", name, message.owner_id, e);
                handler.failure_reply().to_string()
            }
        };
        self.ctx.reply(message.chat_id, &reply).await;
        None
    }

    pub fn get_commands(&self) -> Vec<(String, String)> {
        self.registry.commands()
    }
}

pub fn create_command_registry(ctx: BotContext) -> CommandDispatcher {
    let mut registry = CommandRegistry::new();

    registry.register("start", StartCommand);
    registry.register("model", ModelCommand);
    registry.register("reset", ResetCommand);

    CommandDispatcher::new(Arc::new(registry), ctx)
}
