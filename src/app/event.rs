use crate::pipeline::StreamMessage;

/// Events that can occur in the application
/// Handlers return these events instead of mutating app state directly
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    // Focus and global
    FocusNext,
    FocusPrev,
    Escape,   // list filter, then zoom, then shutdown
    Shutdown, // Ctrl+C or signal

    // Selector / format boxes
    InputChar(char),
    InputBackspace,
    InputDelete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,

    // Group list
    GroupNext,
    GroupPrev,
    StartGroupFilter,
    GroupFilterChar(char),
    GroupFilterBackspace,
    AcceptGroupFilter,

    // Output pane
    ToggleZoom,
    ToggleWrap,
    ToggleLineNumbers,
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    JumpToTop,
    JumpToBottom,

    // Terminal
    Resize { width: u16, height: u16 },

    // Pipelines
    Stream(StreamMessage),
    ShutdownComplete,
}
