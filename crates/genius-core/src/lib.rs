pub mod attachment;
pub mod events;
pub mod history;
pub mod message;
pub mod session;

pub use attachment::{
    encode_image_files, Attachment, AttachmentError, MAX_ATTACHMENTS, MAX_ATTACHMENT_BYTES,
};
pub use events::ChatEvent;
pub use history::HistoryEntry;
pub use message::{Message, Role};
pub use session::Session;
