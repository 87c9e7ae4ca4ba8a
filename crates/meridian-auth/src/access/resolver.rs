//! Pure allow/deny resolution over an access snapshot.
//!
//! Resolution order:
//! 1. Effective groups — active, unexpired memberships expanded through
//!    group ancestors.
//! 2. Applicable grants — active, unexpired grants held by those groups
//!    whose target permission covers the request, directly or through the
//!    permission hierarchy; grants on a more specific node override grants
//!    on a more distant ancestor.
//! 3. Conditions — equality predicates on grant and permission, evaluated
//!    against the request context.
//! 4. Precedence — any applicable deny wins; no applicable grant means
//!    deny (fail closed). `Inherit` rows contribute nothing directly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use meridian_entity::permission::GrantEffect;

use super::snapshot::AccessSnapshot;

/// Outcome of a resolution. Denial is a first-class value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// The principal may perform the action.
    Allow,
    /// The principal may not perform the action.
    Deny,
}

impl AccessDecision {
    /// Whether the decision permits the action.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// How a considered grant participated in the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantDisposition {
    /// Counted toward the decision.
    Matched,
    /// Inactive or past its expiry; contributed nothing.
    Expired,
    /// Grant or permission conditions did not match the context.
    ConditionMismatch,
    /// Shadowed by a grant on a more specific permission node.
    Overridden,
    /// An `inherit` placeholder; contributes nothing by definition.
    Inert,
}

/// One considered grant in an explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantTrace {
    /// The grant row.
    pub grant_id: Uuid,
    /// The group holding the grant.
    pub group_id: Uuid,
    /// The permission node the grant targets.
    pub permission_id: Uuid,
    /// Allow / deny / inherit.
    pub effect: GrantEffect,
    /// Hops from the requested permission node (0 = direct).
    pub distance: usize,
    /// How the grant participated.
    pub disposition: GrantDisposition,
}

/// Decision plus the full rule chain that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessExplanation {
    /// The final decision.
    pub decision: AccessDecision,
    /// Every grant considered, with its disposition.
    pub traces: Vec<GrantTrace>,
}

/// Resolves whether a principal may perform a (resource, action) in a
/// given context. Pure: no side effects, deterministic, total.
#[derive(Debug, Clone)]
pub struct PermissionResolver<'a> {
    snapshot: &'a AccessSnapshot,
}

impl<'a> PermissionResolver<'a> {
    /// Creates a resolver over a snapshot.
    pub fn new(snapshot: &'a AccessSnapshot) -> Self {
        Self { snapshot }
    }

    /// Resolves a decision at the current instant.
    pub fn resolve(
        &self,
        user_id: Uuid,
        resource: &str,
        action: Option<&str>,
        context: &HashMap<String, String>,
    ) -> AccessDecision {
        self.resolve_at(user_id, resource, action, context, Utc::now())
    }

    /// Resolves a decision at an explicit instant.
    pub fn resolve_at(
        &self,
        user_id: Uuid,
        resource: &str,
        action: Option<&str>,
        context: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> AccessDecision {
        self.explain_at(user_id, resource, action, context, now)
            .decision
    }

    /// Resolves and returns the matched rule chain for audit/debugging.
    pub fn explain(
        &self,
        user_id: Uuid,
        resource: &str,
        action: Option<&str>,
        context: &HashMap<String, String>,
    ) -> AccessExplanation {
        self.explain_at(user_id, resource, action, context, Utc::now())
    }

    /// Explanation variant with an explicit instant.
    pub fn explain_at(
        &self,
        user_id: Uuid,
        resource: &str,
        action: Option<&str>,
        context: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> AccessExplanation {
        let groups = self.snapshot.effective_groups(user_id, now);

        // Distance from the request to each permission node that can carry
        // an applicable grant: exact-action matches at 0, wildcard matches
        // at 1, ancestors at their hop count beyond that. A node reachable
        // through several matching targets keeps its smallest distance.
        let mut node_distance: HashMap<Uuid, usize> = HashMap::new();
        for target in self.snapshot.matching_permissions(resource, action) {
            let base = usize::from(target.action.is_none() && action.is_some());
            for (hops, node_id) in self.snapshot.permission_chain(target.id).iter().enumerate() {
                let distance = base + hops;
                node_distance
                    .entry(*node_id)
                    .and_modify(|d| *d = (*d).min(distance))
                    .or_insert(distance);
            }
        }

        let mut traces = Vec::new();

        for group_id in &groups {
            for grant in self.snapshot.grants_for_group(*group_id) {
                let Some(&distance) = node_distance.get(&grant.permission_id) else {
                    continue;
                };

                // A grant anchored on an inactive or deleted permission node
                // is invisible, like an expired grant.
                let anchor_effective = self
                    .snapshot
                    .permission(grant.permission_id)
                    .is_some_and(|p| p.is_effective());

                let disposition = if grant.effect == GrantEffect::Inherit {
                    GrantDisposition::Inert
                } else if !grant.is_effective_at(now) || !anchor_effective {
                    GrantDisposition::Expired
                } else if !self.grant_conditions_match(grant.permission_id, &grant.conditions, context)
                {
                    GrantDisposition::ConditionMismatch
                } else {
                    GrantDisposition::Matched
                };

                traces.push(GrantTrace {
                    grant_id: grant.id,
                    group_id: *group_id,
                    permission_id: grant.permission_id,
                    effect: grant.effect,
                    distance,
                    disposition,
                });
            }
        }

        // Nearest-match override: grants on the closest permission node
        // with any applicable grant shadow grants further up the chain.
        let nearest = traces
            .iter()
            .filter(|t| t.disposition == GrantDisposition::Matched)
            .map(|t| t.distance)
            .min();

        let decision = match nearest {
            None => AccessDecision::Deny,
            Some(nearest) => {
                let mut any_allow = false;
                let mut any_deny = false;
                for trace in &mut traces {
                    if trace.disposition != GrantDisposition::Matched {
                        continue;
                    }
                    if trace.distance > nearest {
                        trace.disposition = GrantDisposition::Overridden;
                        continue;
                    }
                    match trace.effect {
                        GrantEffect::Deny => any_deny = true,
                        GrantEffect::Allow => any_allow = true,
                        GrantEffect::Inherit => {}
                    }
                }
                if any_deny || !any_allow {
                    AccessDecision::Deny
                } else {
                    AccessDecision::Allow
                }
            }
        };

        AccessExplanation { decision, traces }
    }

    /// Evaluates the grant's own conditions plus the targeted permission's.
    fn grant_conditions_match(
        &self,
        permission_id: Uuid,
        grant_conditions: &Option<serde_json::Value>,
        context: &HashMap<String, String>,
    ) -> bool {
        if !conditions_match(grant_conditions.as_ref(), context) {
            return false;
        }
        match self.snapshot.permission(permission_id) {
            Some(permission) => conditions_match(permission.conditions.as_ref(), context),
            None => false,
        }
    }
}

/// Evaluates a JSON condition object against the request context.
///
/// Every key in the predicate must be present in the context with an equal
/// value. A missing predicate always matches; anything that is not an
/// object fails closed.
fn conditions_match(
    conditions: Option<&serde_json::Value>,
    context: &HashMap<String, String>,
) -> bool {
    match conditions {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::Object(predicate)) => {
            predicate.iter().all(|(key, expected)| {
                context.get(key).is_some_and(|actual| match expected {
                    serde_json::Value::String(s) => s == actual,
                    other => other.to_string() == *actual,
                })
            })
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use meridian_entity::group::{Group, GroupKind};
    use meridian_entity::permission::{
        GroupMembership, Permission, PermissionGrant, PermissionKind,
    };
    use serde_json::json;

    struct Fixture {
        snapshot: AccessSnapshot,
        now: DateTime<Utc>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                snapshot: AccessSnapshot::new(),
                now: Utc::now(),
            }
        }

        fn group(&mut self, parent_id: Option<Uuid>) -> Uuid {
            let id = Uuid::new_v4();
            self.snapshot.add_group(Group {
                id,
                company_id: None,
                parent_id,
                name: format!("group-{id}"),
                kind: GroupKind::Custom,
                is_active: true,
                created_at: self.now,
                updated_at: self.now,
                deleted_at: None,
            });
            id
        }

        fn permission(
            &mut self,
            resource: &str,
            action: Option<&str>,
            parent_id: Option<Uuid>,
        ) -> Uuid {
            self.permission_with_conditions(resource, action, parent_id, None)
        }

        fn permission_with_conditions(
            &mut self,
            resource: &str,
            action: Option<&str>,
            parent_id: Option<Uuid>,
            conditions: Option<serde_json::Value>,
        ) -> Uuid {
            let id = Uuid::new_v4();
            self.snapshot.add_permission(Permission {
                id,
                company_id: None,
                parent_id,
                name: format!("{resource}.{}", action.unwrap_or("*")),
                resource: resource.to_string(),
                action: action.map(String::from),
                kind: PermissionKind::Custom,
                conditions,
                is_active: true,
                created_at: self.now,
                updated_at: self.now,
                deleted_at: None,
            });
            id
        }

        fn member(&mut self, user_id: Uuid, group_id: Uuid) {
            self.membership(user_id, group_id, true, None);
        }

        fn membership(
            &mut self,
            user_id: Uuid,
            group_id: Uuid,
            is_active: bool,
            expires_at: Option<DateTime<Utc>>,
        ) {
            self.snapshot.add_membership(GroupMembership {
                id: Uuid::new_v4(),
                user_id,
                group_id,
                is_active,
                expires_at,
                assigned_by: None,
                created_at: self.now,
            });
        }

        fn grant(&mut self, group_id: Uuid, permission_id: Uuid, effect: GrantEffect) {
            self.grant_full(group_id, permission_id, effect, None, None);
        }

        fn grant_full(
            &mut self,
            group_id: Uuid,
            permission_id: Uuid,
            effect: GrantEffect,
            expires_at: Option<DateTime<Utc>>,
            conditions: Option<serde_json::Value>,
        ) {
            self.snapshot.add_grant(PermissionGrant {
                id: Uuid::new_v4(),
                group_id,
                permission_id,
                effect,
                is_active: true,
                expires_at,
                conditions,
                granted_by: None,
                created_at: self.now,
            });
        }

        fn resolve(&self, user_id: Uuid, resource: &str, action: Option<&str>) -> AccessDecision {
            let resolver = PermissionResolver::new(&self.snapshot);
            resolver.resolve_at(user_id, resource, action, &HashMap::new(), self.now)
        }
    }

    #[test]
    fn test_no_grants_is_deny_by_default() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let g = f.group(None);
        f.member(user, g);
        f.permission("order", Some("create"), None);

        assert_eq!(f.resolve(user, "order", Some("create")), AccessDecision::Deny);
    }

    #[test]
    fn test_allow_through_inherited_parent_group() {
        // Cashier inherits from Sales; Sales may create orders.
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let sales = f.group(None);
        let cashier = f.group(Some(sales));
        f.member(user, cashier);
        let perm = f.permission("order", Some("create"), None);
        f.grant(sales, perm, GrantEffect::Allow);

        assert_eq!(f.resolve(user, "order", Some("create")), AccessDecision::Allow);
    }

    #[test]
    fn test_deny_on_child_group_flips_inherited_allow() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let sales = f.group(None);
        let cashier = f.group(Some(sales));
        f.member(user, cashier);
        let perm = f.permission("order", Some("create"), None);
        f.grant(sales, perm, GrantEffect::Allow);
        f.grant(cashier, perm, GrantEffect::Deny);

        assert_eq!(f.resolve(user, "order", Some("create")), AccessDecision::Deny);
    }

    #[test]
    fn test_deny_at_middle_ancestor_beats_allows_elsewhere() {
        // Chain [G, Parent, Grandparent]: deny at Parent overrides allow at
        // Grandparent and at G itself, regardless of grant order.
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let grandparent = f.group(None);
        let parent = f.group(Some(grandparent));
        let g = f.group(Some(parent));
        f.member(user, g);
        let perm = f.permission("ledger", Some("post"), None);
        f.grant(g, perm, GrantEffect::Allow);
        f.grant(grandparent, perm, GrantEffect::Allow);
        f.grant(parent, perm, GrantEffect::Deny);

        assert_eq!(f.resolve(user, "ledger", Some("post")), AccessDecision::Deny);
    }

    #[test]
    fn test_deny_beats_allow_across_unrelated_groups() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let a = f.group(None);
        let b = f.group(None);
        f.member(user, a);
        f.member(user, b);
        let perm = f.permission("invoice", Some("void"), None);
        f.grant(a, perm, GrantEffect::Allow);
        f.grant(b, perm, GrantEffect::Deny);

        assert_eq!(f.resolve(user, "invoice", Some("void")), AccessDecision::Deny);
    }

    #[test]
    fn test_expired_grant_contributes_nothing() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let g = f.group(None);
        f.member(user, g);
        let perm = f.permission("order", Some("create"), None);
        f.grant_full(
            g,
            perm,
            GrantEffect::Allow,
            Some(f.now - Duration::minutes(1)),
            None,
        );

        assert_eq!(f.resolve(user, "order", Some("create")), AccessDecision::Deny);
    }

    #[test]
    fn test_expired_membership_contributes_nothing() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let g = f.group(None);
        f.membership(user, g, true, Some(f.now - Duration::minutes(1)));
        let perm = f.permission("order", Some("create"), None);
        f.grant(g, perm, GrantEffect::Allow);

        assert_eq!(f.resolve(user, "order", Some("create")), AccessDecision::Deny);
    }

    #[test]
    fn test_inactive_membership_contributes_nothing() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let g = f.group(None);
        f.membership(user, g, false, None);
        let perm = f.permission("order", Some("create"), None);
        f.grant(g, perm, GrantEffect::Allow);

        assert_eq!(f.resolve(user, "order", Some("create")), AccessDecision::Deny);
    }

    #[test]
    fn test_inherit_grant_is_inert() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let g = f.group(None);
        f.member(user, g);
        let perm = f.permission("order", Some("create"), None);
        f.grant(g, perm, GrantEffect::Inherit);

        assert_eq!(f.resolve(user, "order", Some("create")), AccessDecision::Deny);
    }

    #[test]
    fn test_grant_on_permission_ancestor_covers_descendant() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let g = f.group(None);
        f.member(user, g);
        // "order" family node covers "order.create".
        let family = f.permission("order", None, None);
        let _create = f.permission("order", Some("create"), Some(family));
        f.grant(g, family, GrantEffect::Allow);

        assert_eq!(f.resolve(user, "order", Some("create")), AccessDecision::Allow);
    }

    #[test]
    fn test_specific_permission_grant_overrides_ancestor_grant() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let g = f.group(None);
        f.member(user, g);
        let family = f.permission("order", None, None);
        let create = f.permission("order", Some("create"), Some(family));
        f.grant(g, family, GrantEffect::Deny);
        f.grant(g, create, GrantEffect::Allow);

        // The specific node shadows the family deny for this action...
        assert_eq!(f.resolve(user, "order", Some("create")), AccessDecision::Allow);
        // ...but the family deny still governs other actions.
        assert_eq!(f.resolve(user, "order", Some("delete")), AccessDecision::Deny);
    }

    #[test]
    fn test_condition_mismatch_makes_grant_inapplicable() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let g = f.group(None);
        f.member(user, g);
        let perm = f.permission("register", Some("open"), None);
        f.grant_full(
            g,
            perm,
            GrantEffect::Allow,
            None,
            Some(json!({"store": "downtown"})),
        );

        let resolver = PermissionResolver::new(&f.snapshot);

        let mut ctx = HashMap::new();
        ctx.insert("store".to_string(), "downtown".to_string());
        assert_eq!(
            resolver.resolve_at(user, "register", Some("open"), &ctx, f.now),
            AccessDecision::Allow
        );

        ctx.insert("store".to_string(), "uptown".to_string());
        assert_eq!(
            resolver.resolve_at(user, "register", Some("open"), &ctx, f.now),
            AccessDecision::Deny
        );

        // Missing context key fails closed as well.
        assert_eq!(
            resolver.resolve_at(user, "register", Some("open"), &HashMap::new(), f.now),
            AccessDecision::Deny
        );
    }

    #[test]
    fn test_permission_conditions_also_gate_the_grant() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let g = f.group(None);
        f.member(user, g);
        let perm = f.permission_with_conditions(
            "report",
            Some("export"),
            None,
            Some(json!({"shift": "day"})),
        );
        f.grant(g, perm, GrantEffect::Allow);

        let resolver = PermissionResolver::new(&f.snapshot);
        let mut ctx = HashMap::new();
        ctx.insert("shift".to_string(), "day".to_string());
        assert_eq!(
            resolver.resolve_at(user, "report", Some("export"), &ctx, f.now),
            AccessDecision::Allow
        );
        assert_eq!(
            resolver.resolve_at(user, "report", Some("export"), &HashMap::new(), f.now),
            AccessDecision::Deny
        );
    }

    #[test]
    fn test_cyclic_group_data_does_not_hang() {
        // Cycles are forbidden by the repository guard; the walk must stay
        // total even if corrupt data slips in.
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let now = f.now;
        f.snapshot.add_group(Group {
            id: a,
            company_id: None,
            parent_id: Some(b),
            name: "a".into(),
            kind: GroupKind::Custom,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        f.snapshot.add_group(Group {
            id: b,
            company_id: None,
            parent_id: Some(a),
            name: "b".into(),
            kind: GroupKind::Custom,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        f.member(user, a);
        let perm = f.permission("order", Some("create"), None);
        f.grant(b, perm, GrantEffect::Allow);

        // Membership in `a` still expands through `b`.
        assert_eq!(f.resolve(user, "order", Some("create")), AccessDecision::Allow);
    }

    #[test]
    fn test_explain_reports_dispositions() {
        let mut f = Fixture::new();
        let user = Uuid::new_v4();
        let sales = f.group(None);
        let cashier = f.group(Some(sales));
        f.member(user, cashier);
        let perm = f.permission("order", Some("create"), None);
        f.grant(sales, perm, GrantEffect::Allow);
        f.grant_full(
            cashier,
            perm,
            GrantEffect::Deny,
            Some(f.now - Duration::minutes(5)),
            None,
        );

        let resolver = PermissionResolver::new(&f.snapshot);
        let explanation =
            resolver.explain_at(user, "order", Some("create"), &HashMap::new(), f.now);

        assert_eq!(explanation.decision, AccessDecision::Allow);
        assert_eq!(explanation.traces.len(), 2);
        assert!(explanation
            .traces
            .iter()
            .any(|t| t.disposition == GrantDisposition::Matched
                && t.effect == GrantEffect::Allow));
        assert!(explanation
            .traces
            .iter()
            .any(|t| t.disposition == GrantDisposition::Expired
                && t.effect == GrantEffect::Deny));
    }
}
