pub mod channels;
pub mod events;
pub mod mentorship;

pub use channels::{derive_channel_id, ChannelProvisioner, HttpChannelProvisioner};
pub use events::{EventBus, StoreEvent};
pub use mentorship::{MentorshipService, Subscription};
