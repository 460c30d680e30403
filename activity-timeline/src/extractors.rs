//! Stock payload extractors for the tracked entity types.

use std::sync::Arc;

use activity_core::errors::Result;
use activity_core::serde_utils::merge_missing;
use activity_protocol::entity::{
    Entity, EntityType, MilestoneInfo, ProjectSummary, RoleSummary, TicketInfo, WikiLinkInfo,
    WikiPageInfo,
};
use activity_protocol::timeline::ExtraData;
use serde_json::{json, Map, Value};

use crate::registry::{Extractor, Registry};

const STOCK_EVENTS: [&str; 3] = ["create", "change", "delete"];

pub(crate) fn register_defaults(registry: &Registry) {
    let extractor: Extractor = Arc::new(default_extractor);
    for kind in EntityType::ALL {
        for event in STOCK_EVENTS {
            registry.insert(format!("{}.{event}", kind.type_name()), extractor.clone());
        }
    }
}

/// Summary of the entity under its payload key, plus its project, plus `extra`.
pub fn default_extractor(entity: &Entity, extra: &ExtraData) -> Result<Value> {
    let mut payload = Map::new();
    match entity {
        Entity::Project(project) => {
            payload.insert("project".into(), project_info(project));
        }
        Entity::Membership(membership) => {
            payload.insert("project".into(), project_info(&membership.project));
            if let Some(user) = &membership.user {
                payload.insert("user".into(), user_info(user.id));
            }
            payload.insert("role".into(), role_info(&membership.role));
        }
        Entity::Milestone(milestone) => {
            payload.insert("milestone".into(), milestone_info(milestone));
            payload.insert("project".into(), project_info(&milestone.project));
        }
        Entity::UserStory(ticket) | Entity::Issue(ticket) | Entity::Task(ticket) => {
            payload.insert(
                entity.entity_type().payload_key().into(),
                ticket_info(ticket),
            );
            payload.insert("project".into(), project_info(&ticket.project));
        }
        Entity::WikiPage(page) => {
            payload.insert("wikipage".into(), wiki_page_info(page));
            payload.insert("project".into(), project_info(&page.project));
        }
        Entity::WikiLink(link) => {
            payload.insert("wikilink".into(), wiki_link_info(link));
            payload.insert("project".into(), project_info(&link.project));
        }
        Entity::User(user) => {
            payload.insert("user".into(), user_info(user.id));
        }
    }

    merge_missing(&mut payload, extra);
    Ok(Value::Object(payload))
}

pub fn project_info(project: &ProjectSummary) -> Value {
    json!({
        "id": project.id,
        "slug": project.slug,
        "name": project.name,
        "description": project.description,
    })
}

pub fn user_info(id: Option<i64>) -> Value {
    json!({ "id": id })
}

fn milestone_info(milestone: &MilestoneInfo) -> Value {
    json!({
        "id": milestone.id,
        "slug": milestone.slug,
        "name": milestone.name,
    })
}

fn ticket_info(ticket: &TicketInfo) -> Value {
    json!({
        "id": ticket.id,
        "ref": ticket.reference,
        "subject": ticket.subject,
    })
}

fn wiki_page_info(page: &WikiPageInfo) -> Value {
    json!({
        "id": page.id,
        "slug": page.slug,
    })
}

fn wiki_link_info(link: &WikiLinkInfo) -> Value {
    json!({
        "id": link.id,
        "title": link.title,
        "href": link.href,
    })
}

fn role_info(role: &RoleSummary) -> Value {
    json!({
        "id": role.id,
        "name": role.name,
    })
}
