use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::{ItemId, YearRange};
use crate::error::{AppError, AppResult};

/// Bounds shared by `input_len` and `top_k`
const MIN_COUNT: usize = 5;
const MAX_COUNT: usize = 20;

/// User-chosen parameters of a selection session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub years: YearRange,
    /// How many movies the user picks before recommendations unlock
    #[serde(default = "default_count")]
    pub input_len: usize,
    /// How many movies each recommendation list holds
    #[serde(default = "default_count")]
    pub top_k: usize,
}

fn default_count() -> usize {
    10
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            years: YearRange::default(),
            input_len: default_count(),
            top_k: default_count(),
        }
    }
}

impl SessionSettings {
    pub fn validate(&self) -> AppResult<()> {
        let years = self.years;
        if years.min > years.max {
            return Err(AppError::InvalidInput(format!(
                "year range {}-{} is inverted",
                years.min, years.max
            )));
        }
        if years.min < YearRange::FLOOR || years.max > YearRange::CEILING {
            return Err(AppError::InvalidInput(format!(
                "years must lie within {}-{}",
                YearRange::FLOOR,
                YearRange::CEILING
            )));
        }
        for (name, value) in [("input_len", self.input_len), ("top_k", self.top_k)] {
            if !(MIN_COUNT..=MAX_COUNT).contains(&value) {
                return Err(AppError::InvalidInput(format!(
                    "{} must be between {} and {}",
                    name, MIN_COUNT, MAX_COUNT
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Settings may still change
    Configuring,
    /// User is picking favorites
    Selecting,
    /// Enough favorites picked, recommendations available
    Complete,
}

/// Result of recording a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    /// The event token or the item was already recorded
    Duplicate,
}

/// One user's progress through picking favorites
#[derive(Debug, Clone, Serialize)]
pub struct SelectionSession {
    pub id: Uuid,
    pub settings: SessionSettings,
    pub phase: SessionPhase,
    liked: Vec<ItemId>,
    #[serde(skip)]
    consumed_events: HashSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SelectionSession {
    /// Creates a session in the configuring phase
    pub fn new(settings: SessionSettings) -> AppResult<Self> {
        settings.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            settings,
            phase: SessionPhase::Configuring,
            liked: Vec::new(),
            consumed_events: HashSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Liked items in the order they were picked
    pub fn liked(&self) -> &[ItemId] {
        &self.liked
    }

    /// Number of items picked so far
    pub fn selected_count(&self) -> usize {
        self.liked.len()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    /// Replaces the settings; only allowed before selection starts
    pub fn update_settings(&mut self, settings: SessionSettings) -> AppResult<()> {
        if self.phase != SessionPhase::Configuring {
            return Err(AppError::Conflict(
                "settings are locked once selection has started".to_string(),
            ));
        }
        settings.validate()?;
        self.settings = settings;
        self.touch();
        Ok(())
    }

    pub fn start(&mut self) -> AppResult<()> {
        match self.phase {
            SessionPhase::Configuring => {
                self.phase = SessionPhase::Selecting;
                self.touch();
                Ok(())
            }
            _ => Err(AppError::Conflict("session already started".to_string())),
        }
    }

    /// Records a liked item, once per event token
    pub fn add_item(&mut self, item_id: ItemId, event_id: Uuid) -> AppResult<AddOutcome> {
        if self.consumed_events.contains(&event_id) {
            return Ok(AddOutcome::Duplicate);
        }
        match self.phase {
            SessionPhase::Selecting => {}
            SessionPhase::Configuring => {
                return Err(AppError::Conflict("session has not started".to_string()))
            }
            SessionPhase::Complete => {
                return Err(AppError::Conflict("selection is already complete".to_string()))
            }
        }

        self.consumed_events.insert(event_id);
        if self.liked.contains(&item_id) {
            return Ok(AddOutcome::Duplicate);
        }

        self.liked.push(item_id);
        if self.liked.len() >= self.settings.input_len {
            self.phase = SessionPhase::Complete;
        }
        self.touch();
        Ok(AddOutcome::Added)
    }

    /// Clears the picks and returns to configuring, keeping settings
    pub fn reset(&mut self) {
        self.liked.clear();
        self.consumed_events.clear();
        self.phase = SessionPhase::Configuring;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
