use std::fmt;
use std::str::FromStr;

use activity_core::errors::{Result, TimelineError};
use serde::{Deserialize, Serialize};

/// Tracked entity kinds. The serialized form is the type name used in event keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    #[serde(rename = "projects.project")]
    Project,
    #[serde(rename = "projects.membership")]
    Membership,
    #[serde(rename = "milestones.milestone")]
    Milestone,
    #[serde(rename = "userstories.userstory")]
    UserStory,
    #[serde(rename = "issues.issue")]
    Issue,
    #[serde(rename = "tasks.task")]
    Task,
    #[serde(rename = "wiki.wikipage")]
    WikiPage,
    #[serde(rename = "wiki.wikilink")]
    WikiLink,
    #[serde(rename = "users.user")]
    User,
}

impl EntityType {
    pub const ALL: [EntityType; 9] = [
        EntityType::Project,
        EntityType::Membership,
        EntityType::Milestone,
        EntityType::UserStory,
        EntityType::Issue,
        EntityType::Task,
        EntityType::WikiPage,
        EntityType::WikiLink,
        EntityType::User,
    ];

    /// `<app>.<model>` name, the first half of an event type key.
    pub fn type_name(self) -> &'static str {
        match self {
            EntityType::Project => "projects.project",
            EntityType::Membership => "projects.membership",
            EntityType::Milestone => "milestones.milestone",
            EntityType::UserStory => "userstories.userstory",
            EntityType::Issue => "issues.issue",
            EntityType::Task => "tasks.task",
            EntityType::WikiPage => "wiki.wikipage",
            EntityType::WikiLink => "wiki.wikilink",
            EntityType::User => "users.user",
        }
    }

    /// Key under which the entity summary is stored inside a payload.
    pub fn payload_key(self) -> &'static str {
        match self {
            EntityType::Project => "project",
            EntityType::Membership => "membership",
            EntityType::Milestone => "milestone",
            EntityType::UserStory => "userstory",
            EntityType::Issue => "issue",
            EntityType::Task => "task",
            EntityType::WikiPage => "wikipage",
            EntityType::WikiLink => "wikilink",
            EntityType::User => "user",
        }
    }

    /// Builds the `<type>.<event>` key for this entity type.
    pub fn event_key(self, event_type: &str) -> Result<String> {
        let event_type = event_type.trim();
        if event_type.is_empty() {
            return Err(TimelineError::invalid("event type must not be empty"));
        }
        Ok(format!("{}.{}", self.type_name(), event_type))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for EntityType {
    type Err = TimelineError;

    fn from_str(value: &str) -> Result<Self> {
        EntityType::ALL
            .into_iter()
            .find(|kind| kind.type_name() == value)
            .ok_or_else(|| TimelineError::invalid(format!("unknown entity type name: {value:?}")))
    }
}

/// Polymorphic reference to a persisted entity (type + id).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub kind: EntityType,
    pub id: i64,
}

impl ObjectRef {
    pub fn new(kind: EntityType, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn user(id: i64) -> Self {
        Self::new(EntityType::User, id)
    }

    pub fn project(id: i64) -> Self {
        Self::new(EntityType::Project, id)
    }

    /// Store identities are positive; anything else was never saved.
    pub fn ensure_persisted(&self) -> Result<()> {
        if self.id > 0 {
            Ok(())
        } else {
            Err(TimelineError::invalid(format!(
                "{} reference has no stable identity (id {})",
                self.kind, self.id
            )))
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectSummary {
    pub id: Option<i64>,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserSummary {
    pub id: Option<i64>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RoleSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MilestoneInfo {
    pub id: Option<i64>,
    pub slug: String,
    pub name: String,
    pub project: ProjectSummary,
}

/// User stories, issues and tasks share the same summary shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TicketInfo {
    pub id: Option<i64>,
    #[serde(rename = "ref")]
    pub reference: i64,
    pub subject: String,
    pub project: ProjectSummary,
    #[serde(default)]
    pub assigned_to: Option<i64>,
    #[serde(default)]
    pub watchers: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WikiPageInfo {
    pub id: Option<i64>,
    pub slug: String,
    pub project: ProjectSummary,
    #[serde(default)]
    pub watchers: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WikiLinkInfo {
    pub id: Option<i64>,
    pub title: String,
    pub href: String,
    pub project: ProjectSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MembershipInfo {
    pub id: Option<i64>,
    pub project: ProjectSummary,
    /// Pending invitations have no user yet.
    pub user: Option<UserSummary>,
    pub role: RoleSummary,
    #[serde(default)]
    pub is_owner: bool,
}

/// A tracked entity as handed over by the host application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Entity {
    Project(ProjectSummary),
    Membership(MembershipInfo),
    Milestone(MilestoneInfo),
    UserStory(TicketInfo),
    Issue(TicketInfo),
    Task(TicketInfo),
    WikiPage(WikiPageInfo),
    WikiLink(WikiLinkInfo),
    User(UserSummary),
}

impl Entity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Project(_) => EntityType::Project,
            Entity::Membership(_) => EntityType::Membership,
            Entity::Milestone(_) => EntityType::Milestone,
            Entity::UserStory(_) => EntityType::UserStory,
            Entity::Issue(_) => EntityType::Issue,
            Entity::Task(_) => EntityType::Task,
            Entity::WikiPage(_) => EntityType::WikiPage,
            Entity::WikiLink(_) => EntityType::WikiLink,
            Entity::User(_) => EntityType::User,
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Entity::Project(info) => info.id,
            Entity::Membership(info) => info.id,
            Entity::Milestone(info) => info.id,
            Entity::UserStory(info) | Entity::Issue(info) | Entity::Task(info) => info.id,
            Entity::WikiPage(info) => info.id,
            Entity::WikiLink(info) => info.id,
            Entity::User(info) => info.id,
        }
    }

    /// Reference to this entity, failing when it was never persisted.
    pub fn object_ref(&self) -> Result<ObjectRef> {
        let kind = self.entity_type();
        match self.id() {
            Some(id) => {
                let reference = ObjectRef::new(kind, id);
                reference.ensure_persisted()?;
                Ok(reference)
            }
            None => Err(TimelineError::invalid(format!(
                "{kind} has not been persisted"
            ))),
        }
    }

    /// The project this entity belongs to. A project belongs to itself; users to none.
    pub fn project(&self) -> Option<&ProjectSummary> {
        match self {
            Entity::Project(info) => Some(info),
            Entity::Membership(info) => Some(&info.project),
            Entity::Milestone(info) => Some(&info.project),
            Entity::UserStory(info) | Entity::Issue(info) | Entity::Task(info) => {
                Some(&info.project)
            }
            Entity::WikiPage(info) => Some(&info.project),
            Entity::WikiLink(info) => Some(&info.project),
            Entity::User(_) => None,
        }
    }

    pub fn project_id(&self) -> Option<i64> {
        self.project().and_then(|project| project.id)
    }

    pub fn assigned_to(&self) -> Option<i64> {
        match self {
            Entity::UserStory(info) | Entity::Issue(info) | Entity::Task(info) => info.assigned_to,
            _ => None,
        }
    }

    pub fn watchers(&self) -> &[i64] {
        match self {
            Entity::UserStory(info) | Entity::Issue(info) | Entity::Task(info) => &info.watchers,
            Entity::WikiPage(info) => &info.watchers,
            _ => &[],
        }
    }
}
