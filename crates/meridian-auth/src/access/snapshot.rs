//! Arena-style snapshot of the permission graph.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use meridian_entity::group::Group;
use meridian_entity::permission::{GroupMembership, Permission, PermissionGrant};

/// All rows needed to answer authorization questions for a tenant,
/// keyed by id.
///
/// The snapshot holds plain rows and walks parent pointers by id lookup;
/// there are no live object references between nodes, so hierarchies of
/// any shape are representable and cycles cannot leak — walks carry a
/// visited set regardless.
#[derive(Debug, Clone, Default)]
pub struct AccessSnapshot {
    groups: HashMap<Uuid, Group>,
    permissions: HashMap<Uuid, Permission>,
    memberships_by_user: HashMap<Uuid, Vec<GroupMembership>>,
    grants_by_group: HashMap<Uuid, Vec<PermissionGrant>>,
}

impl AccessSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group row.
    pub fn add_group(&mut self, group: Group) {
        self.groups.insert(group.id, group);
    }

    /// Adds a permission row.
    pub fn add_permission(&mut self, permission: Permission) {
        self.permissions.insert(permission.id, permission);
    }

    /// Adds a membership row.
    pub fn add_membership(&mut self, membership: GroupMembership) {
        self.memberships_by_user
            .entry(membership.user_id)
            .or_default()
            .push(membership);
    }

    /// Adds a grant row.
    pub fn add_grant(&mut self, grant: PermissionGrant) {
        self.grants_by_group
            .entry(grant.group_id)
            .or_default()
            .push(grant);
    }

    /// Looks up a group by id.
    pub fn group(&self, id: Uuid) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Looks up a permission by id.
    pub fn permission(&self, id: Uuid) -> Option<&Permission> {
        self.permissions.get(&id)
    }

    /// Grant rows held by a group.
    pub fn grants_for_group(&self, group_id: Uuid) -> &[PermissionGrant] {
        self.grants_by_group
            .get(&group_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The principal's effective group set at the given instant.
    ///
    /// Starts from the user's active, unexpired memberships and expands
    /// through each group's ancestor chain: a member of a child group
    /// belongs, for permission purposes, to all its ancestors. Inactive or
    /// soft-deleted groups contribute nothing but do not sever the chain
    /// above them. The visited set makes the walk total even on corrupt
    /// (cyclic) data.
    pub fn effective_groups(&self, user_id: Uuid, now: DateTime<Utc>) -> HashSet<Uuid> {
        let mut effective = HashSet::new();
        let mut visited = HashSet::new();

        let memberships = match self.memberships_by_user.get(&user_id) {
            Some(rows) => rows,
            None => return effective,
        };

        for membership in memberships {
            if !membership.is_effective_at(now) {
                continue;
            }

            let mut cursor = Some(membership.group_id);
            while let Some(group_id) = cursor {
                if !visited.insert(group_id) {
                    break;
                }
                match self.groups.get(&group_id) {
                    Some(group) => {
                        if group.is_effective() {
                            effective.insert(group_id);
                        }
                        cursor = group.parent_id;
                    }
                    None => break,
                }
            }
        }

        effective
    }

    /// Permission nodes that directly cover the requested (resource, action).
    pub fn matching_permissions(&self, resource: &str, action: Option<&str>) -> Vec<&Permission> {
        self.permissions
            .values()
            .filter(|p| p.is_effective() && p.matches(resource, action))
            .collect()
    }

    /// Ancestor chain of a permission node, nearest first, self included.
    ///
    /// Position in the returned vector is the node's distance from the
    /// target — the resolver uses it for nearest-match override.
    pub fn permission_chain(&self, permission_id: Uuid) -> Vec<Uuid> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(permission_id);

        while let Some(id) = cursor {
            if !visited.insert(id) {
                break;
            }
            chain.push(id);
            cursor = self.permissions.get(&id).and_then(|p| p.parent_id);
        }

        chain
    }
}
