//! ACL grant helpers
//!
//! Translates between the SDK's grant structures and the flat grantee
//! strings the CLI accepts (comma-separated canonical ids or group URIs).

use aws_sdk_s3::types::{Grant, Owner};

use osc_core::traits::{AclGrant, AclGrants};

/// Render one SDK grant as a flat (grantee, permission) pair
pub fn flatten_grant(grant: &Grant) -> Option<AclGrant> {
    let grantee = grant.grantee()?;
    let who = grantee
        .display_name()
        .or(grantee.id())
        .or(grantee.uri())
        .or(grantee.email_address())?
        .to_string();
    let permission = grant.permission()?.as_str().to_string();
    Some(AclGrant {
        grantee: who,
        permission,
    })
}

/// Collect owner and grants into the transport-agnostic shape
pub fn flatten_grants(owner: Option<&Owner>, grants: &[Grant]) -> AclGrants {
    AclGrants {
        owner: owner.and_then(|o| o.display_name().or(o.id()).map(|s| s.to_string())),
        grants: grants.iter().filter_map(flatten_grant).collect(),
    }
}

/// Render grantee ids as a grant request header value.
///
/// Ids starting with "http" are group URIs (e.g. AllUsers); anything else
/// is a canonical user id.
pub fn grant_header(grantees: &[String]) -> String {
    grantees
        .iter()
        .map(|g| {
            if g.starts_with("http") {
                format!("uri=\"{g}\"")
            } else {
                format!("id=\"{g}\"")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Split a comma-separated grantee list into trimmed, non-empty entries
pub fn split_grantees(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
