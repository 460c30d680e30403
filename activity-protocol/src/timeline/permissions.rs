use crate::entity::EntityType;

/// View permission required to see entries of each filterable entity type.
///
/// Entity types absent from this table are only visible outside private projects.
pub const VIEW_PERMISSIONS: [(&str, EntityType); 7] = [
    ("view_project", EntityType::Project),
    ("view_milestones", EntityType::Milestone),
    ("view_us", EntityType::UserStory),
    ("view_tasks", EntityType::Task),
    ("view_issues", EntityType::Issue),
    ("view_wiki_pages", EntityType::WikiPage),
    ("view_wiki_links", EntityType::WikiLink),
];

pub fn permission_for(kind: EntityType) -> Option<&'static str> {
    VIEW_PERMISSIONS
        .iter()
        .find(|(_, mapped)| *mapped == kind)
        .map(|(permission, _)| *permission)
}
