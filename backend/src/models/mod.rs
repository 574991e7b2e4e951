pub mod requests;
pub mod connections;

pub use requests::{ChatRequest, Decision, NewChatRequest, RequestStatus};
pub use connections::{ConnectionStatus, MentorshipConnection, Role};
