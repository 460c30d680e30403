pub mod access;
pub mod entity;
pub mod history;
pub mod timeline;

pub mod prelude {
    pub use crate::access::{MembershipGrant, ProjectAccess, UserProfile, Viewer};
    pub use crate::entity::{
        Entity, EntityType, MembershipInfo, MilestoneInfo, ObjectRef, ProjectSummary, RoleSummary,
        TicketInfo, UserSummary, WikiLinkInfo, WikiPageInfo,
    };
    pub use crate::history::{HistoryEntry, HistoryKind};
    pub use crate::timeline::{
        permission_for, ExtraData, Namespace, NewTimelineEntry, TimelineEntry, VIEW_PERMISSIONS,
    };
}
