//! Session memory persisted across runs
//!
//! Memory is split by concern into three JSON files under one directory:
//!
//! - `main.json`: `last_cuisines`, `last_regions`, `last_poll`
//! - `trends.json`: `last_trends`
//! - `insights.json`: `user_insights`, `liked_trends`
//!
//! A missing, empty, or unreadable file yields that file's defaults. Loading
//! never fails.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use cookbot_core::{CookbotError, MemoryLimits, Result};

pub const MAIN_FILE: &str = "main.json";
pub const TRENDS_FILE: &str = "trends.json";
pub const INSIGHTS_FILE: &str = "insights.json";

/// Poll published at the end of a run, awaiting a vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRecord {
    pub message_id: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct MainFile {
    #[serde(default)]
    last_cuisines: Vec<String>,
    #[serde(default)]
    last_regions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_poll")]
    last_poll: Option<PollRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct TrendsFile {
    #[serde(default, deserialize_with = "lenient_string_list")]
    last_trends: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct InsightsFile {
    #[serde(default)]
    user_insights: Vec<String>,
    #[serde(default)]
    liked_trends: Vec<String>,
}

/// In-memory view of all three files
///
/// Sequences named `last_*` are most-recent-first. `user_insights` and
/// `liked_trends` are in append order.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMemory {
    pub last_cuisines: Vec<String>,
    pub last_regions: Vec<String>,
    pub last_trends: Vec<String>,
    pub user_insights: Vec<String>,
    pub liked_trends: Vec<String>,
    pub last_poll: Option<PollRecord>,
    limits: MemoryLimits,
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self::new(MemoryLimits::default())
    }
}

fn push_front_bounded(list: &mut Vec<String>, items: Vec<String>, bound: usize) {
    let mut merged = items;
    merged.append(list);
    merged.truncate(bound);
    *list = merged;
}

impl SessionMemory {
    pub fn new(limits: MemoryLimits) -> Self {
        Self {
            last_cuisines: Vec::new(),
            last_regions: Vec::new(),
            last_trends: Vec::new(),
            user_insights: Vec::new(),
            liked_trends: Vec::new(),
            last_poll: None,
            limits,
        }
    }

    pub fn limits(&self) -> &MemoryLimits {
        &self.limits
    }

    pub fn record_cuisine(&mut self, cuisine: impl Into<String>) {
        push_front_bounded(
            &mut self.last_cuisines,
            vec![cuisine.into()],
            self.limits.recent_cuisines,
        );
    }

    pub fn record_region(&mut self, region: impl Into<String>) {
        push_front_bounded(
            &mut self.last_regions,
            vec![region.into()],
            self.limits.recent_regions,
        );
    }

    /// Put a batch of idea names in front, keeping the batch's own order
    pub fn record_trends(&mut self, names: &[String]) {
        let batch = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        push_front_bounded(&mut self.last_trends, batch, self.limits.recent_trends);
    }

    /// Append an insight; only the newest `insight_retention` are kept
    pub fn record_insight(&mut self, insight: impl Into<String>) {
        let insight = insight.into();
        if insight.trim().is_empty() {
            return;
        }
        self.user_insights.push(insight);
        let excess = self
            .user_insights
            .len()
            .saturating_sub(self.limits.insight_retention);
        self.user_insights.drain(..excess);
    }

    /// Insights shown to the analyst, oldest first
    pub fn recent_insights(&self) -> &[String] {
        let start = self
            .user_insights
            .len()
            .saturating_sub(self.limits.insight_window);
        &self.user_insights[start..]
    }

    pub fn record_liked(&mut self, dish: impl Into<String>) {
        self.liked_trends.push(dish.into());
    }

    /// Most recent liked dishes, oldest first
    pub fn recent_liked(&self, count: usize) -> &[String] {
        let start = self.liked_trends.len().saturating_sub(count);
        &self.liked_trends[start..]
    }

    pub fn record_poll(&mut self, poll: PollRecord) {
        self.last_poll = Some(poll);
    }

    pub fn take_poll(&mut self) -> Option<PollRecord> {
        self.last_poll.take()
    }

    /// Settle the pending poll
    ///
    /// `winner` is 1-based. A winner naming one of the options is appended to
    /// `liked_trends`. The poll is cleared whether or not a winner was found.
    /// Returns the liked dish, if any.
    pub fn consume_poll(&mut self, winner: Option<usize>) -> Option<String> {
        let poll = self.take_poll()?;
        let dish = winner
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| poll.options.get(i))
            .cloned()?;
        self.record_liked(dish.clone());
        Some(dish)
    }

    fn split(&self) -> (MainFile, TrendsFile, InsightsFile) {
        (
            MainFile {
                last_cuisines: self.last_cuisines.clone(),
                last_regions: self.last_regions.clone(),
                last_poll: self.last_poll.clone(),
            },
            TrendsFile {
                last_trends: self.last_trends.clone(),
            },
            InsightsFile {
                user_insights: self.user_insights.clone(),
                liked_trends: self.liked_trends.clone(),
            },
        )
    }
}

/// Reads and writes [`SessionMemory`] under one directory
#[derive(Debug, Clone)]
pub struct MemoryStore {
    dir: PathBuf,
    limits: MemoryLimits,
}

impl MemoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            limits: MemoryLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: MemoryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load all three files; problems fall back to defaults
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn load(&self) -> SessionMemory {
        let main: MainFile = read_or_default(&self.dir.join(MAIN_FILE));
        let trends: TrendsFile = read_or_default(&self.dir.join(TRENDS_FILE));
        let insights: InsightsFile = read_or_default(&self.dir.join(INSIGHTS_FILE));

        let mut memory = SessionMemory::new(self.limits.clone());
        memory.last_cuisines = main.last_cuisines;
        memory.last_regions = main.last_regions;
        memory.last_poll = main.last_poll;
        memory.last_trends = trends.last_trends;
        memory.user_insights = insights.user_insights;
        memory.liked_trends = insights.liked_trends;

        debug!(
            "Loaded memory: {} cuisines, {} trends, {} insights",
            memory.last_cuisines.len(),
            memory.last_trends.len(),
            memory.user_insights.len()
        );
        memory
    }

    /// Write all three files, creating the directory if needed
    #[instrument(skip(self, memory), fields(dir = %self.dir.display()))]
    pub fn save(&self, memory: &SessionMemory) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| write_error(&self.dir, e))?;

        let (main, trends, insights) = memory.split();
        write_pretty(&self.dir.join(MAIN_FILE), &main)?;
        write_pretty(&self.dir.join(TRENDS_FILE), &trends)?;
        write_pretty(&self.dir.join(INSIGHTS_FILE), &insights)?;

        info!("Saved session memory to {}", self.dir.display());
        Ok(())
    }

    /// Replace stored memory with empty defaults
    pub fn clear(&self) -> Result<()> {
        self.save(&SessionMemory::new(self.limits.clone()))
    }
}

fn read_or_default<T>(path: &Path) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!("Could not read {}: {}; using defaults", path.display(), e);
            return T::default();
        }
    };

    if content.trim().is_empty() {
        return T::default();
    }

    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Malformed {}: {}; using defaults", path.display(), e);
            T::default()
        }
    }
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, e: std::io::Error) -> CookbotError {
    CookbotError::Memory(format!("Failed to write {}: {}", path.display(), e))
}

/// Accepts `null`, `{}` and numeric ids as written by older tooling
fn lenient_poll<'de, D>(deserializer: D) -> std::result::Result<Option<PollRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };

    let message_id = match map.get("message_id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Ok(None),
    };
    let options = map
        .get("options")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Some(PollRecord {
        message_id,
        options,
    }))
}

/// Flattens nested batches (`[["a", "b"], "c"]`) into one list
fn lenient_string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            _ => {}
        }
    }

    let value = Value::deserialize(deserializer)?;
    let mut out = Vec::new();
    collect(&value, &mut out);
    Ok(out)
}
