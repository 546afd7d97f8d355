/// Lifecycle of a pipeline stage.
///
/// ```text
/// Idle -> Loading -> Readable <-> Loading -> Ended | Errored -> Closed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StageState {
    #[default]
    Idle,
    Loading,
    Readable,
    Ended,
    Errored,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageEvent {
    /// A fetch from upstream started.
    Load,
    /// Data arrived.
    Loaded,
    /// Upstream is exhausted.
    End,
    Fail,
    Close,
}

impl StageState {
    /// Pure transition function. `Closed` absorbs every event; the first
    /// terminal state reached sticks until the stage is closed.
    pub fn on(self, event: StageEvent) -> StageState {
        use StageEvent::*;
        use StageState::*;
        match (self, event) {
            (Closed, _) | (_, Close) => Closed,
            (Ended, _) | (Errored, _) => self,
            (_, Fail) => Errored,
            (_, End) => Ended,
            (Idle, Load) | (Readable, Load) => Loading,
            (Loading, Loaded) | (Idle, Loaded) => Readable,
            (s, _) => s,
        }
    }

    /// True once no further items will be produced.
    pub fn is_terminal(self) -> bool {
        matches!(self, StageState::Ended | StageState::Errored | StageState::Closed)
    }
}
