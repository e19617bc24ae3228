use std::cmp::Ordering;

use semver::Version;

use crate::version::error::VersionParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    Outdated { current: Version, latest: Version },
    UpToDate,
}

/// Parse an image tag into a semver::Version, normalizing partial versions.
///
/// Strips a single leading 'v' and pads a partial version core with zeros
/// before any pre-release or build suffix.
///
/// Examples:
/// - "v1.2.3" -> Version(1, 2, 3)
/// - "1.2" -> Version(1, 2, 0)
/// - "1-rc.1" -> Version(1, 0, 0, pre: rc.1)
pub fn parse_tag(tag: &str) -> Result<Version, semver::Error> {
    let tag = tag.strip_prefix('v').unwrap_or(tag);
    let (core, suffix) = match tag.find(['-', '+']) {
        Some(idx) => tag.split_at(idx),
        None => (tag, ""),
    };

    let normalized = match core.split('.').count() {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => tag.to_string(),
    };
    Version::parse(&normalized)
}

/// Order two versions by semver precedence, ignoring build metadata.
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

/// Greatest version among the tags that parse, or None if none do
pub fn latest_version(tags: &[String]) -> Option<Version> {
    tags.iter()
        .filter_map(|tag| parse_tag(tag).ok())
        .max_by(cmp_precedence)
}

/// Decide whether `current_tag` is behind the newest of `remote_tags`.
///
/// Remote tags that are not versions are ignored. An unparseable current tag
/// is an error, while a remote set with no versions at all counts as up to date.
pub fn compare_tags(
    current_tag: &str,
    remote_tags: &[String],
) -> Result<UpdateStatus, VersionParseError> {
    let current = parse_tag(current_tag).map_err(|source| VersionParseError {
        tag: current_tag.to_string(),
        source,
    })?;

    match latest_version(remote_tags) {
        Some(latest) if cmp_precedence(&latest, &current) == Ordering::Greater => {
            Ok(UpdateStatus::Outdated { current, latest })
        }
        _ => Ok(UpdateStatus::UpToDate),
    }
}
