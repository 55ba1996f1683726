mod commands;
mod scheduler;
mod state;

pub use commands::{CommandSender, LayoutCommand};
pub use scheduler::{LayoutFrame, Scheduler, SchedulerState, SubscriptionId, TickReport};
