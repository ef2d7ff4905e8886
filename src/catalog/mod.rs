//! Static challenge catalog
//!
//! The catalog is a fixed set of 36 challenges (12 per difficulty tier),
//! loaded once at startup into an immutable title-keyed map. Challenge
//! threads are named `[Difficulty] Title`; matching a thread back to its
//! catalog entry is how the scanner and the ingestion path figure out
//! which challenge a submission belongs to.

mod data;

use serde::Serialize;
use std::collections::HashMap;

/// Challenge difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Parse a difficulty name, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }

    /// Prefix character used in challenge ids (`b*`, `i*`, `a*`)
    pub fn id_prefix(&self) -> char {
        match self {
            Difficulty::Beginner => 'b',
            Difficulty::Intermediate => 'i',
            Difficulty::Advanced => 'a',
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "Beginner"),
            Difficulty::Intermediate => write!(f, "Intermediate"),
            Difficulty::Advanced => write!(f, "Advanced"),
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    /// Globally unique id, prefix-coded by difficulty
    pub id: String,
    /// Title, unique within its tier (matching is case-insensitive)
    pub title: String,
    /// Difficulty tier
    pub difficulty: Difficulty,
    /// Problem statement shown to users and to the reviewer prompt
    pub description: String,
    /// Reference solution embedded in the review prompt
    pub reference_solution: String,
    /// Topic tags (always non-empty)
    pub tags: Vec<String>,
}

/// Immutable lookup over the static challenge dataset
pub struct ChallengeCatalog {
    entries: Vec<Challenge>,
    by_title: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
}

impl ChallengeCatalog {
    /// Build the catalog from the static dataset.
    ///
    /// Must be called before any thread-name matching. The maps are built
    /// into a fresh value; there is no global mutable state to reload.
    pub fn load() -> Self {
        let entries = data::all_challenges();

        let mut by_title = HashMap::with_capacity(entries.len());
        let mut by_id = HashMap::with_capacity(entries.len());
        for (i, challenge) in entries.iter().enumerate() {
            by_title.insert(challenge.title.to_lowercase(), i);
            by_id.insert(challenge.id.clone(), i);
        }

        Self {
            entries,
            by_title,
            by_id,
        }
    }

    /// Look up a challenge by id
    pub fn get(&self, id: &str) -> Option<&Challenge> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    /// Look up a challenge by title, case-insensitively
    pub fn get_by_title(&self, title: &str) -> Option<&Challenge> {
        self.by_title
            .get(&title.trim().to_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// Match a thread name of the form `[Difficulty] Title` to its entry.
    ///
    /// The difficulty tag and title are both case-insensitive and
    /// whitespace-trimmed. Any other format yields no match.
    pub fn match_thread_name(&self, thread_name: &str) -> Option<&Challenge> {
        let name = thread_name.trim();
        let rest = name.strip_prefix('[')?;
        let close = rest.find(']')?;

        let difficulty = Difficulty::parse(&rest[..close])?;
        let title = rest[close + 1..].trim();
        if title.is_empty() {
            return None;
        }

        let challenge = self.get_by_title(title)?;
        if challenge.difficulty != difficulty {
            return None;
        }

        Some(challenge)
    }

    /// All entries, in tier order
    pub fn entries(&self) -> &[Challenge] {
        &self.entries
    }

    /// Entries for one tier
    pub fn tier(&self, difficulty: Difficulty) -> impl Iterator<Item = &Challenge> {
        self.entries
            .iter()
            .filter(move |c| c.difficulty == difficulty)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
