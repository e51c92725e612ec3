//! Linear setup flow: reference document, then audio, then chat.

use crate::context::ContextStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Document,
    Audio,
    Chat,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::Document => 1,
            Step::Audio => 2,
            Step::Chat => 3,
        }
    }
}

/// What happened to one optional input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputStatus {
    Pending,
    Provided(String),
    PreviouslyIndexed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    step: Step,
    document: InputStatus,
    audio: InputStatus,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: Step::Document,
            document: InputStatus::Pending,
            audio: InputStatus::Pending,
        }
    }

    /// Starting position given the backend's `/status` answer. An index left
    /// over from an earlier run skips straight to the audio step.
    pub fn from_status(pdf_processed: bool, context: &mut ContextStore) -> Self {
        let mut wizard = Self::new();
        context.set_document_indexed(pdf_processed);
        if pdf_processed {
            wizard.document = InputStatus::PreviouslyIndexed;
            wizard.step = Step::Audio;
        }
        wizard
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn document(&self) -> &InputStatus {
        &self.document
    }

    pub fn audio(&self) -> &InputStatus {
        &self.audio
    }

    pub fn document_indexed(&mut self, context: &mut ContextStore, filename: impl Into<String>) {
        context.set_document_indexed(true);
        self.document = InputStatus::Provided(filename.into());
        self.step = Step::Audio;
    }

    pub fn skip_document(&mut self, context: &mut ContextStore) {
        context.set_document_indexed(false);
        self.document = InputStatus::Skipped;
        self.step = Step::Audio;
    }

    pub fn audio_transcribed(
        &mut self,
        context: &mut ContextStore,
        transcript: impl Into<String>,
        filename: impl Into<String>,
    ) {
        context.set_transcript(Some(transcript.into()));
        self.audio = InputStatus::Provided(filename.into());
        self.step = Step::Chat;
    }

    pub fn skip_audio(&mut self, context: &mut ContextStore) {
        context.set_transcript(None);
        self.audio = InputStatus::Skipped;
        self.step = Step::Chat;
    }

    /// Back to the first step with nothing supplied.
    pub fn reset(&mut self, context: &mut ContextStore) {
        context.clear();
        *self = Self::new();
    }

    pub fn document_summary(&self) -> String {
        match &self.document {
            InputStatus::Pending => "Rules PDF: Not provided yet".to_string(),
            InputStatus::Provided(name) => format!("Rules PDF: {name}"),
            InputStatus::PreviouslyIndexed => "Rules PDF: Previously Indexed.".to_string(),
            InputStatus::Skipped => "Rules PDF: Skipped".to_string(),
        }
    }

    pub fn audio_summary(&self) -> String {
        match &self.audio {
            InputStatus::Pending => "Audio File: Not provided yet".to_string(),
            InputStatus::Provided(name) => format!("Audio File: {name}"),
            InputStatus::PreviouslyIndexed | InputStatus::Skipped => {
                "Audio File: Skipped".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStore;

    fn context() -> ContextStore {
        ContextStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn fresh_backend_starts_at_document_step() {
        let mut ctx = context();
        let wizard = Wizard::from_status(false, &mut ctx);

        assert_eq!(wizard.step(), Step::Document);
        assert!(!ctx.document_indexed());
    }

    #[test]
    fn existing_index_starts_at_audio_step() {
        let mut ctx = context();
        let wizard = Wizard::from_status(true, &mut ctx);

        assert_eq!(wizard.step(), Step::Audio);
        assert!(ctx.document_indexed());
        assert_eq!(wizard.document_summary(), "Rules PDF: Previously Indexed.");
    }

    #[test]
    fn full_flow_records_both_inputs() {
        let mut ctx = context();
        let mut wizard = Wizard::new();

        wizard.document_indexed(&mut ctx, "rules.pdf");
        assert_eq!(wizard.step(), Step::Audio);
        wizard.audio_transcribed(&mut ctx, "we agreed", "meeting.mp3");

        assert_eq!(wizard.step(), Step::Chat);
        assert_eq!(wizard.document_summary(), "Rules PDF: rules.pdf");
        assert_eq!(wizard.audio_summary(), "Audio File: meeting.mp3");
        let snapshot = ctx.snapshot();
        assert!(snapshot.document_indexed);
        assert_eq!(snapshot.transcript.as_deref(), Some("we agreed"));
    }

    #[test]
    fn skipping_both_leaves_no_context() {
        let mut ctx = context();
        let mut wizard = Wizard::new();

        wizard.skip_document(&mut ctx);
        wizard.skip_audio(&mut ctx);

        assert_eq!(wizard.step(), Step::Chat);
        assert_eq!(wizard.document(), &InputStatus::Skipped);
        assert_eq!(wizard.audio_summary(), "Audio File: Skipped");
        assert!(!ctx.snapshot().has_source());
    }

    #[test]
    fn reset_returns_to_start() {
        let mut ctx = context();
        let mut wizard = Wizard::new();
        wizard.document_indexed(&mut ctx, "rules.pdf");
        wizard.audio_transcribed(&mut ctx, "t", "a.wav");

        wizard.reset(&mut ctx);

        assert_eq!(wizard, Wizard::new());
        assert!(!ctx.snapshot().has_source());
    }

    #[test]
    fn steps_are_numbered_in_order() {
        assert!(Step::Document < Step::Audio && Step::Audio < Step::Chat);
        assert_eq!(Step::Chat.number(), 3);
    }
}
