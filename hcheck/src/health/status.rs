use serde::{Deserialize, Serialize};

/// Tri-state health classification of a single test or of a whole evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Available,
    Degraded,
    Unavailable,
}

impl Status {
    /// Reduces many statuses into one. Unavailable wins outright, Degraded wins
    /// over Available, and an empty input is Available.
    pub fn reduce<I>(statuses: I) -> Status
    where
        I: IntoIterator<Item = Status>,
    {
        let mut overall = Status::Available;
        for status in statuses {
            match status {
                Status::Unavailable => return Status::Unavailable,
                Status::Degraded => overall = Status::Degraded,
                Status::Available => {}
            }
        }
        overall
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Status::Unavailable)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Available => write!(f, "available"),
            Status::Degraded => write!(f, "degraded"),
            Status::Unavailable => write!(f, "unavailable"),
        }
    }
}
