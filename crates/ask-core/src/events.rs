/// Lifecycle of one question: `Idle → Sending → Streaming → terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    Idle,
    Sending,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

impl QueryPhase {
    pub fn is_active(self) -> bool {
        matches!(self, QueryPhase::Sending | QueryPhase::Streaming)
    }
}

/// Display updates emitted by the query controller, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The user's question, shown as soon as it is accepted.
    Question { content: String },

    /// Provisional answer text until the stream opens.
    Placeholder { content: String },

    /// The response stream opened; the placeholder should be cleared.
    AnswerStarted,

    /// Rendered text appended to the answer.
    Token { content: String },

    /// The answer was replaced wholesale (server error before any content).
    Replaced { content: String },

    /// Stopped marker appended after a cancellation.
    Stopped { marker: String },

    /// Failure text appended after partial output.
    Error { content: String },

    /// Inline status line next to the input (validation messages).
    Status { message: String, is_error: bool },

    Controls {
        submit_enabled: bool,
        stop_enabled: bool,
    },

    FocusInput,

    Finished { phase: QueryPhase },
}
