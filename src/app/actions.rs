use super::state::{PromptKind, Screen, SearchFocus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextScreen,
    PrevScreen,
    SetScreen(Screen),
    SetSearchFocus(SearchFocus),

    SidebarUp,
    SidebarDown,
    ListUp,
    ListDown,
    GoTop,
    GoBottom,
    PageUp,
    PageDown,

    InputChar(char),
    Backspace,
    ClearInput,
    StartSearch,
    ClearSearches,

    // Playlist
    AddSelected,
    StartPlayback,
    RemoveSelected,
    ClearPlaylist,
    Skip,

    // Save / load prompt
    OpenPrompt(PromptKind),
    PromptChar(char),
    PromptBackspace,
    PromptSubmit,
    PromptCancel,

    TogglePause,
    VolumeUp,
    VolumeDown,
    SeekForward,
    SeekBack,

    Resize,
}
