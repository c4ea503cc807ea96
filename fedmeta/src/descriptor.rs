use serde::Serialize;
use thiserror::Error;
use url::Url;

/// A validated identity provider entry from federation metadata.
///
/// Only constructed through [ProviderDescriptor::validate], so holding one
/// means `entity_id`, `entry_point` and `logout_url` are non-empty and both
/// URLs parse. The URLs are kept exactly as they were written in the
/// metadata. There are no setters; a descriptor never changes after it has
/// been validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    #[serde(rename = "entityID")]
    entity_id: String,
    #[serde(rename = "entryPoint")]
    entry_point: String,
    #[serde(rename = "logoutUrl")]
    logout_url: String,
    certificates: Vec<String>,
}

impl ProviderDescriptor {
    /// Validate `raw` against `rules`.
    ///
    /// Every check is run, so the error carries every problem with the entry
    /// rather than just the first one hit.
    pub fn validate(raw: RawDescriptor, rules: &Rules) -> Result<Self, Invalid> {
        let mut violations = Vec::new();

        let entity_id = non_empty(raw.entity_id);
        if entity_id.is_none() {
            violations.push(Violation::MissingEntityId);
        }

        let entry_point = match non_empty(raw.entry_point) {
            None => {
                violations.push(Violation::MissingEntryPoint);
                None
            }
            Some(location) => match Url::parse(&location) {
                Ok(_) => Some(location),
                Err(e) => {
                    violations.push(Violation::MalformedEntryPoint(location, e));
                    None
                }
            },
        };

        let logout_url = match non_empty(raw.logout_url) {
            None => {
                violations.push(Violation::MissingLogoutUrl);
                None
            }
            Some(location) => match Url::parse(&location) {
                Ok(_) => Some(location),
                Err(e) => {
                    violations.push(Violation::MalformedLogoutUrl(location, e));
                    None
                }
            },
        };

        if rules.require_certificate && raw.certificates.iter().all(String::is_empty) {
            violations.push(Violation::NoCertificate);
        }

        match (entity_id, entry_point, logout_url) {
            (Some(entity_id), Some(entry_point), Some(logout_url)) if violations.is_empty() => {
                Ok(ProviderDescriptor {
                    entity_id,
                    entry_point,
                    logout_url,
                    certificates: raw.certificates,
                })
            }
            (entity_id, _, _) => Err(Invalid {
                entity_id,
                violations,
            }),
        }
    }

    /// Unique identifier of the identity provider.
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Where to send users to log in (`SingleSignOnService`).
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Where to send users to log out (`SingleLogoutService`).
    pub fn logout_url(&self) -> &str {
        &self.logout_url
    }

    /// Signing certificates in document order with whitespace removed.
    ///
    /// An entry may be empty when the metadata held a blank certificate; treat
    /// those as absent.
    pub fn certificates(&self) -> &[String] {
        &self.certificates
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Fields pulled out of an entity descriptor before any checks are run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDescriptor {
    pub entity_id: Option<String>,
    pub entry_point: Option<String>,
    pub logout_url: Option<String>,
    pub certificates: Vec<String>,
}

/// Checks applied on top of the required fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rules {
    /// Reject descriptors without at least one non-empty certificate.
    pub require_certificate: bool,
}

/// One failed check on a descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("entityID attribute is missing or empty")]
    MissingEntityId,
    #[error("SingleSignOnService Location is missing or empty")]
    MissingEntryPoint,
    #[error("SingleLogoutService Location is missing or empty")]
    MissingLogoutUrl,
    #[error("SingleSignOnService Location {0:?} is not a valid URL: {1}")]
    MalformedEntryPoint(String, url::ParseError),
    #[error("SingleLogoutService Location {0:?} is not a valid URL: {1}")]
    MalformedLogoutUrl(String, url::ParseError),
    #[error("no usable signing certificate")]
    NoCertificate,
}

/// A descriptor that failed validation, with every check it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalid {
    /// The descriptor's entity ID, when it had a usable one.
    pub entity_id: Option<String>,
    /// Never empty.
    pub violations: Vec<Violation>,
}

impl std::fmt::Display for Invalid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.entity_id {
            Some(id) => write!(f, "invalid entity descriptor {:?}: ", id)?,
            None => write!(f, "invalid entity descriptor: ")?,
        }
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for Invalid {}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw() -> RawDescriptor {
        RawDescriptor {
            entity_id: Some("https://idp.example.com".into()),
            entry_point: Some("https://idp.example.com/sso".into()),
            logout_url: Some("https://idp.example.com/slo".into()),
            certificates: vec!["MIIC".into()],
        }
    }

    #[test]
    fn test_valid_descriptor_keeps_fields() {
        let descriptor = ProviderDescriptor::validate(raw(), &Rules::default()).unwrap();
        assert_eq!(descriptor.entity_id(), "https://idp.example.com");
        assert_eq!(descriptor.entry_point(), "https://idp.example.com/sso");
        assert_eq!(descriptor.logout_url(), "https://idp.example.com/slo");
        assert_eq!(descriptor.certificates(), &["MIIC".to_string()][..]);
    }

    #[test]
    fn test_urls_are_not_rewritten() {
        let descriptor = ProviderDescriptor::validate(
            RawDescriptor {
                entry_point: Some("HTTPS://IDP.example.com".into()),
                ..raw()
            },
            &Rules::default(),
        )
        .unwrap();
        assert_eq!(descriptor.entry_point(), "HTTPS://IDP.example.com");
    }

    #[test]
    fn test_all_violations_are_reported() {
        let err = ProviderDescriptor::validate(
            RawDescriptor {
                entity_id: Some("".into()),
                entry_point: None,
                logout_url: Some("not a url".into()),
                certificates: vec![],
            },
            &Rules::default(),
        )
        .unwrap_err();
        assert_eq!(err.entity_id, None);
        assert_eq!(err.violations.len(), 3);
        assert_eq!(err.violations[0], Violation::MissingEntityId);
        assert_eq!(err.violations[1], Violation::MissingEntryPoint);
        assert!(matches!(err.violations[2], Violation::MalformedLogoutUrl(ref l, _) if l == "not a url"));
    }

    #[test]
    fn test_missing_logout_only_is_rejected() {
        let err = ProviderDescriptor::validate(
            RawDescriptor {
                logout_url: None,
                ..raw()
            },
            &Rules::default(),
        )
        .unwrap_err();
        assert_eq!(err.entity_id.as_deref(), Some("https://idp.example.com"));
        assert_eq!(err.violations, vec![Violation::MissingLogoutUrl]);
    }

    #[test]
    fn test_empty_certificates_allowed_by_default() {
        let descriptor = ProviderDescriptor::validate(
            RawDescriptor {
                certificates: vec!["".into()],
                ..raw()
            },
            &Rules::default(),
        )
        .unwrap();
        assert_eq!(descriptor.certificates(), &["".to_string()][..]);
    }

    #[test]
    fn test_require_certificate_rejects_blank_certificates() {
        let rules = Rules {
            require_certificate: true,
        };
        for certificates in vec![vec![], vec!["".to_string()]] {
            let err = ProviderDescriptor::validate(
                RawDescriptor {
                    certificates,
                    ..raw()
                },
                &rules,
            )
            .unwrap_err();
            assert_eq!(err.violations, vec![Violation::NoCertificate]);
        }
        assert!(ProviderDescriptor::validate(raw(), &rules).is_ok());
    }

    #[test]
    fn test_invalid_display_lists_every_check() {
        let invalid = Invalid {
            entity_id: Some("idp2".into()),
            violations: vec![Violation::MissingEntryPoint, Violation::MissingLogoutUrl],
        };
        assert_eq!(
            invalid.to_string(),
            "invalid entity descriptor \"idp2\": SingleSignOnService Location is missing or \
             empty; SingleLogoutService Location is missing or empty"
        );
    }

    #[test]
    fn test_serializes_with_metadata_field_names() {
        let descriptor = ProviderDescriptor::validate(raw(), &Rules::default()).unwrap();
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "entityID": "https://idp.example.com",
                "entryPoint": "https://idp.example.com/sso",
                "logoutUrl": "https://idp.example.com/slo",
                "certificates": ["MIIC"],
            })
        );
    }
}
