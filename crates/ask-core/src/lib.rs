pub mod context;
pub mod decoder;
pub mod error;
pub mod events;
pub mod render;
pub mod storage;
pub mod wizard;

pub use context::{generate_session_id, ContextStore, SessionContext, SESSION_ID_KEY};
pub use decoder::Utf8StreamDecoder;
pub use error::{Result, StoreError};
pub use events::{ChatEvent, QueryPhase};
pub use render::{OutputBuffer, RenderStyle, Rendered, ERROR_PREFIX};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use wizard::{InputStatus, Step, Wizard};
