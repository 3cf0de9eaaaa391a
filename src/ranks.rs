//! Rank system
//!
//! Defines experience thresholds, display metadata, and rank resolution.

/// Rank definition
#[derive(Debug, Clone)]
pub struct RankDef {
    pub id: &'static str,
    pub name: &'static str,
    pub min_experience: i64,
    /// Hex display color for the rank badge
    pub color: &'static str,
    /// Whether the badge gets the glow treatment in the UI
    pub glow: bool,
}

/// All rank definitions (must be sorted ascending by `min_experience`,
/// first entry is the zero-threshold floor)
pub static RANKS: &[RankDef] = &[
    RankDef {
        id: "unranked",
        name: "Unranked",
        min_experience: 0,
        color: "#9aa0a6",
        glow: false,
    },
    RankDef {
        id: "bronze",
        name: "Bronze",
        min_experience: 1000,
        color: "#cd7f32",
        glow: false,
    },
    RankDef {
        id: "silver",
        name: "Silver",
        min_experience: 2500,
        color: "#c0c0c0",
        glow: false,
    },
    RankDef {
        id: "gold",
        name: "Gold",
        min_experience: 5000,
        color: "#ffd700",
        glow: false,
    },
    RankDef {
        id: "platinum",
        name: "Platinum",
        min_experience: 10000,
        color: "#5ce1e6",
        glow: false,
    },
    RankDef {
        id: "diamond",
        name: "Diamond",
        min_experience: 20000,
        color: "#b9f2ff",
        glow: true,
    },
    RankDef {
        id: "master",
        name: "Master",
        min_experience: 35000,
        color: "#ff5e5e",
        glow: true,
    },
    RankDef {
        id: "legend",
        name: "Legend",
        min_experience: 60000,
        color: "#c770ff",
        glow: true,
    },
];

impl RankDef {
    /// Resolve the rank for a given experience total.
    ///
    /// Pure: scans the table and returns the last entry whose threshold is
    /// at or below `experience`. Falls back to the floor entry, which only
    /// happens for a (rejected-elsewhere) negative total.
    pub fn for_experience(experience: i64) -> &'static RankDef {
        RANKS
            .iter()
            .rev()
            .find(|r| experience >= r.min_experience)
            .unwrap_or(&RANKS[0])
    }

    /// Look up a rank by its stored ID
    pub fn by_id(id: &str) -> Option<&'static RankDef> {
        RANKS.iter().find(|r| r.id == id)
    }

    /// The rank immediately above this one, or `None` at the terminal rank
    pub fn next(&self) -> Option<&'static RankDef> {
        let index = RANKS.iter().position(|r| r.id == self.id)?;
        RANKS.get(index + 1)
    }
}

/// A user's position in the rank ladder
#[derive(Debug, Clone)]
pub struct RankProgress {
    pub rank: &'static RankDef,
    pub next_rank: Option<&'static RankDef>,
    /// Fraction of the way to the next threshold (0.0 - 1.0)
    pub progress: f32,
}

/// Compute rank, next rank, and progress fraction for an experience total
pub fn rank_progress(experience: i64) -> RankProgress {
    let rank = RankDef::for_experience(experience);
    let next_rank = rank.next();

    let progress = match next_rank {
        Some(next) => {
            let span = next.min_experience - rank.min_experience;
            if span <= 0 {
                1.0
            } else {
                let into = (experience - rank.min_experience) as f32 / span as f32;
                into.clamp(0.0, 1.0)
            }
        }
        None => 1.0, // Terminal rank
    };

    RankProgress {
        rank,
        next_rank,
        progress,
    }
}
