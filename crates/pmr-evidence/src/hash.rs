//! Content hashing for evidence records.
//!
//! Spec.md mandates the literal `sha256:<hex>` wire format, so this crate
//! uses `sha2` rather than a faster non-cryptographic hash — noted in
//! DESIGN.md.

use pmr_types::Artifact;
use sha2::{Digest, Sha256};

/// Hash is computed over artifact paths concatenated with their content, in
/// the order given, each pair NUL-separated so `("a","b")` and `("ab","")`
/// cannot collide.
#[must_use]
pub fn compute_content_hash(artifacts: &[Artifact]) -> String {
    let mut hasher = Sha256::new();
    for artifact in artifacts {
        hasher.update(artifact.path.as_bytes());
        hasher.update([0u8]);
        if let Some(content) = &artifact.content {
            hasher.update(content.as_bytes());
        }
        hasher.update([0u8]);
    }
    format!("sha256:{:x}", hasher.finalize())
}

#[must_use]
pub fn verify_content_hash(artifacts: &[Artifact], expected: &str) -> bool {
    compute_content_hash(artifacts) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_for_same_input() {
        let artifacts = vec![Artifact {
            path: "a.txt".into(),
            content: Some("hello".into()),
            size: Some(5),
        }];
        let h1 = compute_content_hash(&artifacts);
        let h2 = compute_content_hash(&artifacts);
        assert_eq!(h1, h2);
        assert!(h1.starts_with("sha256:"));
    }

    #[test]
    fn verify_round_trips() {
        let artifacts = vec![Artifact {
            path: "a.txt".into(),
            content: Some("hello".into()),
            size: Some(5),
        }];
        let hash = compute_content_hash(&artifacts);
        assert!(verify_content_hash(&artifacts, &hash));
    }

    #[test]
    fn differing_content_changes_hash() {
        let a = vec![Artifact {
            path: "a.txt".into(),
            content: Some("hello".into()),
            size: Some(5),
        }];
        let b = vec![Artifact {
            path: "a.txt".into(),
            content: Some("world".into()),
            size: Some(5),
        }];
        assert_ne!(compute_content_hash(&a), compute_content_hash(&b));
    }

    #[test]
    fn path_content_boundary_does_not_collide() {
        let a = vec![Artifact {
            path: "ab".into(),
            content: Some(String::new()),
            size: Some(0),
        }];
        let b = vec![Artifact {
            path: "a".into(),
            content: Some("b".into()),
            size: Some(1),
        }];
        assert_ne!(compute_content_hash(&a), compute_content_hash(&b));
    }
}
