//! Persisted session state
//!
//! The CLI analog of the original UI's session bookkeeping: the last search
//! results and which company is currently selected, stored as JSON under the
//! data directory so separate `search` / `select` / `ask` invocations share
//! one application state.

use crate::leads::LeadRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SESSION_FILE: &str = "session.json";

/// Session errors; all recoverable, the user just stays where they were
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No search results saved yet; run `leadscope search` first")]
    NoResults,

    #[error("No company selected; run `leadscope select <number>` first")]
    NoSelection,

    #[error("Selection {given} out of range; results hold {count} companies")]
    OutOfRange { given: usize, count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Application state shared across CLI invocations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Results of the most recent search
    pub leads: Vec<LeadRecord>,

    /// Index into `leads` of the currently selected company
    pub selected: Option<usize>,
}

impl Session {
    /// Load the session, or start fresh if none was saved yet
    pub fn load(data_dir: &Path) -> Result<Self, SessionError> {
        let path = Self::path(data_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the session
    pub fn save(&self, data_dir: &Path) -> Result<(), SessionError> {
        std::fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path(data_dir), content)?;
        Ok(())
    }

    fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(SESSION_FILE)
    }

    /// Replace the result set; any previous selection no longer applies
    pub fn set_leads(&mut self, leads: Vec<LeadRecord>) {
        self.leads = leads;
        self.selected = None;
    }

    /// Select a company by 1-based position in the result list
    pub fn select(&mut self, number: usize) -> Result<&LeadRecord, SessionError> {
        if self.leads.is_empty() {
            return Err(SessionError::NoResults);
        }
        if number == 0 || number > self.leads.len() {
            return Err(SessionError::OutOfRange {
                given: number,
                count: self.leads.len(),
            });
        }
        self.selected = Some(number - 1);
        Ok(&self.leads[number - 1])
    }

    /// The currently selected company record
    pub fn selected_lead(&self) -> Result<&LeadRecord, SessionError> {
        if self.leads.is_empty() {
            return Err(SessionError::NoResults);
        }
        let index = self.selected.ok_or(SessionError::NoSelection)?;
        self.leads.get(index).ok_or(SessionError::NoSelection)
    }
}
