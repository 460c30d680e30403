// Integration tests covering hooks, fan-out and permission-filtered feeds end to end.
use std::sync::Arc;

use activity::prelude::*;
use activity::timeline::{
    render_entries, FanOut, MemoryDirectory, MemoryTimelineStore, Registry, TimelineHooks,
    TimelineReader, TimelineWriter,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

struct Fixture {
    hooks: TimelineHooks,
    reader: TimelineReader,
    directory: MemoryDirectory,
}

fn fixture() -> Fixture {
    let store = MemoryTimelineStore::new();
    let directory = MemoryDirectory::new();
    let writer = TimelineWriter::new(Arc::new(Registry::with_defaults()), Arc::new(store.clone()));
    let hooks = TimelineHooks::new(FanOut::new(Arc::new(directory.clone())), Arc::new(writer));
    let reader = TimelineReader::new(Arc::new(store), Arc::new(directory.clone()));
    Fixture {
        hooks,
        reader,
        directory,
    }
}

fn project(id: i64) -> ProjectSummary {
    ProjectSummary {
        id: Some(id),
        slug: format!("project-{id}"),
        name: format!("Project {id}"),
        description: String::new(),
    }
}

fn issue(id: i64, project_id: i64, watchers: Vec<i64>) -> Entity {
    Entity::Issue(TicketInfo {
        id: Some(id),
        reference: id,
        subject: format!("issue {id}"),
        project: project(project_id),
        assigned_to: None,
        watchers,
    })
}

fn task(id: i64, project_id: i64) -> Entity {
    Entity::Task(TicketInfo {
        id: Some(id),
        reference: id,
        subject: format!("task {id}"),
        project: project(project_id),
        ..Default::default()
    })
}

async fn record(fixture: &Fixture, entity: Entity, actor: i64) {
    let recorded = fixture
        .hooks
        .on_history_entry(&HistoryEntry::new(HistoryKind::Create, entity, actor))
        .await
        .expect("history entry");
    assert!(recorded);
}

#[tokio::test]
async fn private_project_entries_are_hidden_from_strangers() {
    let fixture = fixture();
    fixture.directory.upsert_project(ProjectAccess::private(1, &[]));
    record(&fixture, issue(10, 1, vec![]), 5).await;

    let unfiltered = fixture.reader.project_feed(1, None).await.expect("feed");
    assert_eq!(unfiltered.len(), 1);

    let anonymous = fixture
        .reader
        .project_feed(1, Some(Viewer::Anonymous))
        .await
        .expect("feed");
    assert!(anonymous.is_empty());

    let stranger = fixture
        .reader
        .project_feed(1, Some(Viewer::User(99)))
        .await
        .expect("feed");
    assert!(stranger.is_empty());
}

#[tokio::test]
async fn member_role_controls_which_types_are_visible() {
    let fixture = fixture();
    fixture.directory.upsert_project(ProjectAccess::private(1, &[]));
    fixture.directory.upsert_membership(MembershipGrant {
        project_id: 1,
        user_id: 7,
        is_owner: false,
        permissions: vec!["view_issues".into()],
    });
    record(&fixture, issue(10, 1, vec![]), 5).await;
    record(&fixture, task(11, 1), 5).await;

    let visible = fixture
        .reader
        .project_feed(1, Some(Viewer::User(7)))
        .await
        .expect("feed");
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].payload_type, EntityType::Issue);

    assert!(fixture.directory.set_role_permissions(1, 7, &["view_issues", "view_tasks"]));
    let widened = fixture
        .reader
        .project_feed(1, Some(Viewer::User(7)))
        .await
        .expect("feed");
    assert_eq!(widened.len(), 2);
}

#[tokio::test]
async fn owners_see_everything_mapped() {
    let fixture = fixture();
    fixture.directory.upsert_project(ProjectAccess::private(1, &[]));
    fixture.directory.upsert_membership(MembershipGrant {
        project_id: 1,
        user_id: 7,
        is_owner: true,
        permissions: vec![],
    });
    record(&fixture, issue(10, 1, vec![]), 5).await;
    record(&fixture, task(11, 1), 5).await;
    record(&fixture, Entity::Project(project(1)), 5).await;

    let visible = fixture
        .reader
        .project_feed(1, Some(Viewer::User(7)))
        .await
        .expect("feed");
    assert_eq!(visible.len(), 3);
}

#[tokio::test]
async fn anonymous_permissions_open_a_private_project_partially() {
    let fixture = fixture();
    fixture
        .directory
        .upsert_project(ProjectAccess::private(1, &["view_tasks"]));
    record(&fixture, issue(10, 1, vec![]), 5).await;
    record(&fixture, task(11, 1), 5).await;

    let visible = fixture
        .reader
        .project_feed(1, Some(Viewer::Anonymous))
        .await
        .expect("feed");
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].event_type, "tasks.task.create");
}

#[tokio::test]
async fn public_and_projectless_entries_are_always_visible() {
    let fixture = fixture();
    fixture.directory.upsert_project(ProjectAccess::public(2));
    record(&fixture, issue(10, 2, vec![]), 5).await;
    fixture
        .hooks
        .on_user_created(&UserSummary {
            id: Some(5),
            username: "ann".into(),
        })
        .await
        .expect("user hook");

    let visible = fixture
        .reader
        .user_feed(5, Some(Viewer::Anonymous))
        .await
        .expect("feed");
    assert_eq!(visible.len(), 2);
}

#[tokio::test]
async fn related_people_see_events_on_profile_feed_only() {
    let fixture = fixture();
    fixture.directory.upsert_project(ProjectAccess::public(2));
    record(&fixture, issue(10, 2, vec![8]), 5).await;

    let profile = fixture.reader.profile_feed(8, None).await.expect("profile");
    assert_eq!(profile.len(), 1);
    assert_eq!(profile[0].namespace, "user:5");

    let own = fixture.reader.user_feed(8, None).await.expect("own feed");
    assert!(own.is_empty());
}

#[tokio::test]
async fn feed_payloads_render_the_current_user_profile() {
    let fixture = fixture();
    fixture.directory.upsert_project(ProjectAccess::public(2));
    fixture.directory.upsert_user(UserProfile {
        id: 5,
        username: "ann".into(),
        full_name: "Ann Example".into(),
        photo: None,
        big_photo: None,
        date_joined: Utc.with_ymd_and_hms(2015, 5, 5, 0, 0, 0).unwrap(),
    });
    record(&fixture, issue(10, 2, vec![]), 5).await;

    let mut entries = fixture.reader.user_feed(5, None).await.expect("feed");
    render_entries(&mut entries, &fixture.directory)
        .await
        .expect("render");

    assert_eq!(entries[0].payload["user"]["name"], "Ann Example");
    assert_eq!(entries[0].payload["issue"], json!({"id": 10, "ref": 10, "subject": "issue 10"}));
}
