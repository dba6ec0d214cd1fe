/// Fast-forward simulation of the daily schedule: one virtual hour per
/// tick, a full day in 24 ticks, then back to real time on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewSequencer {
    state: PreviewState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum PreviewState {
    #[default]
    Idle,
    Running {
        next_hour: u8,
    },
}

impl PreviewSequencer {
    /// Begin a preview run at virtual hour 0. Re-triggering during a
    /// run restarts it from the top.
    pub fn start(&mut self) {
        self.state = PreviewState::Running { next_hour: 0 };
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PreviewState::Running { .. })
    }

    /// Advance one tick. Returns the virtual hour to display, or
    /// `None` when idle. After hour 23 is handed out the run is over
    /// and the sequencer is idle again.
    pub fn advance(&mut self) -> Option<u8> {
        match self.state {
            PreviewState::Idle => None,
            PreviewState::Running { next_hour } => {
                self.state = if next_hour >= 23 {
                    PreviewState::Idle
                } else {
                    PreviewState::Running {
                        next_hour: next_hour + 1,
                    }
                };
                Some(next_hour)
            }
        }
    }
}
