mod case;
mod chat;
mod driver;
mod preview;
mod state;
mod synthesis;

pub use case::{Case, CaseFile, CaseId, CaseRegistry, CaseState, CaseStatus, Settlement, SettleRejection};
pub use chat::{ChatState, CHAT_FALLBACK_ERROR};
pub use driver::SessionDriver;
pub use preview::{ImagePreview, OverlayBox, PreviewSlot};
pub use state::{AnalysisReply, Command, Event, Selection, Session, UNKNOWN_ERROR};
pub use synthesis::{SynthesisAction, SynthesisState, SynthesisStatus, SYNTHESIS_ERROR_PREFIX};
