//! In-process RBAC-with-domains policy oracle.
//!
//! Policy text has one rule per line:
//!
//! ```text
//! # permission: subject or role, tenant, resource, action
//! p, admin, looplex, resource, read
//! # grouping: subject, role, tenant
//! g, bob.rivest@email.com, admin, looplex
//! ```
//!
//! `*` in the tenant, resource or action column of a `p` line (or the tenant
//! column of a `g` line) matches anything. Role membership is transitive
//! within a tenant. There are no deny rules; anything not allowed is denied.

use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::{OracleError, PolicyParseError};
use crate::oracle::PermissionOracle;

const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
struct PermissionRule {
    subject: String,
    tenant: String,
    resource: String,
    action: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupingRule {
    subject: String,
    role: String,
    tenant: String,
}

fn matches(pattern: &str, value: &str) -> bool {
    pattern == WILDCARD || pattern == value
}

/// Permission oracle backed by static policy text.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyOracle {
    permissions: Vec<PermissionRule>,
    groupings: Vec<GroupingRule>,
}

impl StaticPolicyOracle {
    /// Parses policy text.
    pub fn parse(text: &str) -> Result<Self, PolicyParseError> {
        let mut oracle = Self::default();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
            if fields.iter().any(|f| f.is_empty()) {
                return Err(PolicyParseError {
                    line,
                    message: "empty field".to_string(),
                });
            }

            match fields[0] {
                "p" => {
                    if fields.len() != 5 {
                        return Err(PolicyParseError {
                            line,
                            message: format!(
                                "permission rule needs 4 values, found {}",
                                fields.len() - 1
                            ),
                        });
                    }
                    oracle.permissions.push(PermissionRule {
                        subject: fields[1].to_string(),
                        tenant: fields[2].to_string(),
                        resource: fields[3].to_string(),
                        action: fields[4].to_string(),
                    });
                }
                "g" => {
                    if fields.len() != 4 {
                        return Err(PolicyParseError {
                            line,
                            message: format!(
                                "grouping rule needs 3 values, found {}",
                                fields.len() - 1
                            ),
                        });
                    }
                    oracle.groupings.push(GroupingRule {
                        subject: fields[1].to_string(),
                        role: fields[2].to_string(),
                        tenant: fields[3].to_string(),
                    });
                }
                other => {
                    return Err(PolicyParseError {
                        line,
                        message: format!("unknown rule type '{other}'"),
                    });
                }
            }
        }

        Ok(oracle)
    }

    /// The subject itself plus every role it holds in `tenant`.
    fn subjects_for(&self, subject: &str, tenant: &str) -> HashSet<String> {
        let mut resolved = HashSet::from([subject.to_string()]);
        let mut pending = vec![subject.to_string()];

        while let Some(current) = pending.pop() {
            for rule in &self.groupings {
                if rule.subject == current
                    && matches(&rule.tenant, tenant)
                    && resolved.insert(rule.role.clone())
                {
                    pending.push(rule.role.clone());
                }
            }
        }

        resolved
    }

    /// Synchronous decision used by the [`PermissionOracle`] impl.
    pub fn is_allowed(&self, subject: &str, tenant: &str, resource: &str, action: &str) -> bool {
        let subjects = self.subjects_for(subject, tenant);
        self.permissions.iter().any(|rule| {
            subjects.contains(&rule.subject)
                && matches(&rule.tenant, tenant)
                && matches(&rule.resource, resource)
                && matches(&rule.action, action)
        })
    }

    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }
}

impl FromStr for StaticPolicyOracle {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[async_trait]
impl PermissionOracle for StaticPolicyOracle {
    async fn enforce(
        &self,
        subject: &str,
        tenant: &str,
        resource: &str,
        action: &str,
    ) -> Result<bool, OracleError> {
        Ok(self.is_allowed(subject, tenant, resource, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = r"
        # looplex tenant
        p, bob.rivest@email.com, looplex, resource, read
        p, bob.rivest@email.com, looplex, resource, write
        p, bob.rivest@email.com, looplex, resource, delete
        p, admin, *, users, *
        g, alice@email.com, admin, looplex
        g, carol@email.com, operators, acme
        g, operators, admin, acme
    ";

    fn oracle() -> StaticPolicyOracle {
        POLICY.parse().unwrap()
    }

    #[test]
    fn test_direct_permissions() {
        let oracle = oracle();
        assert!(oracle.is_allowed("bob.rivest@email.com", "looplex", "resource", "read"));
        assert!(oracle.is_allowed("bob.rivest@email.com", "looplex", "resource", "write"));
        assert!(oracle.is_allowed("bob.rivest@email.com", "looplex", "resource", "delete"));
        assert!(!oracle.is_allowed("bob.rivest@email.com", "looplex", "resource", "execute"));
        assert!(!oracle.is_allowed("bob.rivest@email.com", "acme", "resource", "read"));
    }

    #[test]
    fn test_role_is_scoped_to_tenant() {
        let oracle = oracle();
        assert!(oracle.is_allowed("alice@email.com", "looplex", "users", "create"));
        assert!(!oracle.is_allowed("alice@email.com", "acme", "users", "create"));
        assert!(!oracle.is_allowed("alice@email.com", "looplex", "groups", "create"));
    }

    #[test]
    fn test_roles_resolve_transitively() {
        let oracle = oracle();
        assert!(oracle.is_allowed("carol@email.com", "acme", "users", "delete"));
    }

    #[test]
    fn test_parse_counts_rules() {
        assert_eq!(oracle().permission_count(), 4);
        assert_eq!(StaticPolicyOracle::parse("").unwrap().permission_count(), 0);
    }

    #[test]
    fn test_parse_rejects_short_rule() {
        let err = StaticPolicyOracle::parse("p, admin, *, users, *\np, admin, users")
            .unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_parse_rejects_unknown_rule_type() {
        let err = StaticPolicyOracle::parse("\n\nx, a, b, c").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("'x'"));
    }

    #[test]
    fn test_parse_rejects_empty_field() {
        let err = StaticPolicyOracle::parse("g, bob, , looplex").unwrap_err();
        assert_eq!(err.line, 1);
    }
}
