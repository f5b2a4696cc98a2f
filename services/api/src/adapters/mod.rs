pub mod chat_webhook;
pub mod pdf;
pub mod plan_webhook;
pub mod store;

pub use chat_webhook::WebhookChatAdapter;
pub use pdf::PrintPdfExporter;
pub use plan_webhook::WebhookPlanAdapter;
pub use store::FileStore;
