//! Diagnostics for entries dropped while ingesting metadata.
//!
//! Extraction and whitelist mapping never fail because of a single bad
//! entry. Instead every dropped entry is reported to a [Sink]. Use
//! [TracingSink] to log them or a `Vec<Diagnostic>` to keep them around.
use crate::descriptor::Invalid;

/// Why an entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The entity descriptor at `position` (zero based, counting every
    /// `md:EntityDescriptor` in the document) failed validation.
    Rejected { position: usize, invalid: Invalid },
    /// A valid descriptor had no key in the whitelist.
    Unmapped { entity_id: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Rejected { position, invalid } => {
                write!(f, "Dropping entity descriptor #{}: {}", position, invalid)
            }
            Diagnostic::Unmapped { entity_id } => {
                write!(f, "No whitelist entry for entity ID {:?}, ignoring it", entity_id)
            }
        }
    }
}

/// Somewhere to report dropped entries.
pub trait Sink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Collect diagnostics so they can be inspected afterwards.
impl Sink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

/// Log every diagnostic as a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::Rejected { position, invalid } => tracing::warn!(
                position,
                entity_id = ?invalid.entity_id,
                "{}",
                diagnostic
            ),
            Diagnostic::Unmapped { entity_id } => {
                tracing::warn!(entity_id = %entity_id, "{}", diagnostic)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::Violation;

    #[test]
    fn test_rejected_message_names_position_and_checks() {
        let diagnostic = Diagnostic::Rejected {
            position: 1,
            invalid: Invalid {
                entity_id: Some("idp2".into()),
                violations: vec![Violation::MissingEntryPoint],
            },
        };
        assert_eq!(
            diagnostic.to_string(),
            "Dropping entity descriptor #1: invalid entity descriptor \"idp2\": \
             SingleSignOnService Location is missing or empty"
        );
    }

    #[test]
    fn test_unmapped_message_names_entity_id() {
        let diagnostic = Diagnostic::Unmapped {
            entity_id: "idp3".into(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "No whitelist entry for entity ID \"idp3\", ignoring it"
        );
    }

    #[test]
    fn test_vec_sink_collects_through_mut_ref() {
        fn emit_one(mut sink: impl Sink) {
            sink.emit(Diagnostic::Unmapped {
                entity_id: "a".into(),
            });
        }

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        emit_one(&mut diagnostics);
        emit_one(&mut diagnostics);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_tracing_sink_accepts_diagnostics() {
        TracingSink.emit(Diagnostic::Unmapped {
            entity_id: "a".into(),
        });
    }
}
