pub mod domain;
pub mod focus;
pub mod layout;
pub mod normalize;
pub mod ports;
pub mod quota;
pub mod response;

pub use domain::{
    AuthSession, ChatMessage, LearningPlanRecord, PdfExport, PlanProfile, SchoolLevel, Sender,
    User, UserCredentials,
};
pub use ports::{
    ChatAnswerService, PlanExportService, PlanGenerationService, PortError, PortResult,
    StorageService,
};
