use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bitset::{DAYS_IN_MONTH, DAYS_IN_TWO_WEEKS, DAYS_IN_WEEK, full_mask};
use crate::error::PlannerError;

pub type TaskId = String;

pub const NONE_TAG_ID: &str = "NONE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub order: i64,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub class_id: Option<String>,
}

impl Tag {
    /// The built-in tag every untagged task points at.
    pub fn none() -> Self {
        Self {
            id: NONE_TAG_ID.to_string(),
            order: 0,
            name: "None".to_string(),
            color: "gray".to_string(),
            class_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub order: i64,
    pub name: String,
    pub complete: bool,
    pub in_focus: bool,
}

/// Position of a task in each list it can be dragged within.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderKeys {
    #[serde(rename = "order")]
    pub focus: i64,
    #[serde(rename = "futureViewOrder", default)]
    pub future_view: i64,
}

impl OrderKeys {
    pub fn new(order: i64) -> Self {
        Self {
            focus: order,
            future_view: order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(flatten)]
    pub order: OrderKeys,
    #[serde(default)]
    pub owner: Vec<String>,
    pub name: String,
    pub tag: String,
    pub complete: bool,
    pub in_focus: bool,
    #[serde(default)]
    pub children: Vec<SubTask>,
    pub metadata: TaskMetadata,
}

impl Task {
    /// Calendar instant for dated tasks, `None` for repeating templates.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        match &self.metadata {
            TaskMetadata::OneTime { date, .. } | TaskMetadata::Group { date, .. } => Some(*date),
            TaskMetadata::Repeating(_) => None,
        }
    }

    pub fn group(&self) -> Option<&str> {
        match &self.metadata {
            TaskMetadata::Group { group, .. } => Some(group),
            TaskMetadata::OneTime { .. } | TaskMetadata::Repeating(_) => None,
        }
    }

    pub fn repeating(&self) -> Option<&RepeatingTaskMetadata> {
        match &self.metadata {
            TaskMetadata::Repeating(meta) => Some(meta),
            TaskMetadata::OneTime { .. } | TaskMetadata::Group { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum TaskMetadata {
    #[serde(rename = "ONE_TIME", rename_all = "camelCase")]
    OneTime {
        date: DateTime<Utc>,
        #[serde(default, rename = "icalUID", skip_serializing_if = "Option::is_none")]
        ical_uid: Option<String>,
    },
    #[serde(rename = "MASTER_TEMPLATE")]
    Repeating(RepeatingTaskMetadata),
    #[serde(rename = "GROUP")]
    Group { date: DateTime<Utc>, group: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepeatingTaskMetadata {
    pub date: RepeatingDate,
    #[serde(default)]
    pub forks: Vec<ForkedTaskMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepeatingDate {
    pub start_date: DateTime<Utc>,
    pub end_date: RepeatEnd,
    pub pattern: RepeatingPattern,
}

/// A repeating task stops either after a concrete date or after a number
/// of occurrences.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RepeatEnd {
    Count(u32),
    Date(DateTime<Utc>),
}

/// An override of one occurrence. `fork_id` points at the one-time task
/// replacing it; `None` means the occurrence was cancelled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForkedTaskMetadata {
    pub fork_id: Option<TaskId>,
    pub replace_date: DateTime<Utc>,
}

/// Recurrence mask. Constructed only through the checked constructors so
/// that a mask never exceeds the width of its variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawPattern", into = "RawPattern")]
pub enum RepeatingPattern {
    Weekly(u32),
    Biweekly(u32),
    Monthly(u32),
}

impl RepeatingPattern {
    pub fn weekly(mask: u32) -> Result<Self, PlannerError> {
        check_mask("weekly", mask, DAYS_IN_WEEK).map(Self::Weekly)
    }

    pub fn biweekly(mask: u32) -> Result<Self, PlannerError> {
        check_mask("biweekly", mask, DAYS_IN_TWO_WEEKS).map(Self::Biweekly)
    }

    pub fn monthly(mask: u32) -> Result<Self, PlannerError> {
        check_mask("monthly", mask, DAYS_IN_MONTH).map(Self::Monthly)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Weekly(_) => "weekly",
            Self::Biweekly(_) => "biweekly",
            Self::Monthly(_) => "monthly",
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Self::Weekly(_) => DAYS_IN_WEEK,
            Self::Biweekly(_) => DAYS_IN_TWO_WEEKS,
            Self::Monthly(_) => DAYS_IN_MONTH,
        }
    }

    pub fn mask(&self) -> u32 {
        match self {
            Self::Weekly(mask) | Self::Biweekly(mask) | Self::Monthly(mask) => *mask,
        }
    }
}

fn check_mask(kind: &'static str, mask: u32, width: u32) -> Result<u32, PlannerError> {
    if mask > full_mask(width) {
        return Err(PlannerError::InvalidPatternMask { kind, mask, width });
    }
    Ok(mask)
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum RawPattern {
    Weekly {
        #[serde(rename = "bitSet")]
        bit_set: u32,
    },
    Biweekly {
        #[serde(rename = "bitSet")]
        bit_set: u32,
    },
    Monthly {
        #[serde(rename = "bitSet")]
        bit_set: u32,
    },
}

impl TryFrom<RawPattern> for RepeatingPattern {
    type Error = PlannerError;

    fn try_from(raw: RawPattern) -> Result<Self, Self::Error> {
        match raw {
            RawPattern::Weekly { bit_set } => Self::weekly(bit_set),
            RawPattern::Biweekly { bit_set } => Self::biweekly(bit_set),
            RawPattern::Monthly { bit_set } => Self::monthly(bit_set),
        }
    }
}

impl From<RepeatingPattern> for RawPattern {
    fn from(pattern: RepeatingPattern) -> Self {
        match pattern {
            RepeatingPattern::Weekly(bit_set) => RawPattern::Weekly { bit_set },
            RepeatingPattern::Biweekly(bit_set) => RawPattern::Biweekly { bit_set },
            RepeatingPattern::Monthly(bit_set) => RawPattern::Monthly { bit_set },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub canvas_calendar: Option<String>,
    pub completed_onboarding: bool,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            canvas_calendar: None,
            completed_onboarding: true,
            theme: Theme::Light,
        }
    }
}

/// Which banner messages the user has dismissed, keyed by message id.
pub type BannerMessageStatus = BTreeMap<String, bool>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExamKind {
    Final,
    Prelim,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExamTime {
    #[serde(rename = "type")]
    pub kind: ExamKind,
    /// Milliseconds since the unix epoch.
    pub time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub course_id: u64,
    pub subject: String,
    pub course_number: String,
    pub title: String,
    #[serde(default)]
    pub exam_times: Vec<ExamTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    pub deadline: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingGroupInvite {
    pub id: String,
    pub group: String,
    pub inviter_name: String,
}

pub type TaskIdSet = BTreeSet<TaskId>;

/// The whole normalized store.
///
/// `tasks` is the primary map; the four index fields are derived from it
/// and are only ever rewritten by [`crate::store::Planner::apply`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub tags: BTreeMap<String, Tag>,
    pub tasks: BTreeMap<TaskId, Task>,
    pub date_task_map: BTreeMap<chrono::NaiveDate, TaskIdSet>,
    pub group_task_map: BTreeMap<String, TaskIdSet>,
    pub repeated_task_set: TaskIdSet,
    pub group_task_set: TaskIdSet,
    pub settings: Settings,
    pub banner_message_status: BannerMessageStatus,
    pub courses: BTreeMap<String, Vec<Course>>,
    pub groups: BTreeMap<String, Group>,
    pub group_invites: BTreeMap<String, PendingGroupInvite>,
}

impl Default for State {
    fn default() -> Self {
        let none = Tag::none();
        Self {
            tags: BTreeMap::from([(none.id.clone(), none)]),
            tasks: BTreeMap::new(),
            date_task_map: BTreeMap::new(),
            group_task_map: BTreeMap::new(),
            repeated_task_set: BTreeSet::new(),
            group_task_set: BTreeSet::new(),
            settings: Settings::default(),
            banner_message_status: BTreeMap::new(),
            courses: BTreeMap::new(),
            groups: BTreeMap::new(),
            group_invites: BTreeMap::new(),
        }
    }
}
